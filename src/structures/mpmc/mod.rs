//! Bounded MPMC ring buffer

/// MPMC ring buffer implementation
pub mod mpmc;


// Export the main types
pub use mpmc::MpmcRing;
