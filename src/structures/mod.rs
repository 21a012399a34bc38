/// Core reusable data structures
pub mod mpmc;

// Export the main types
pub use mpmc::MpmcRing;
