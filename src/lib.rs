//! # Workring
//!
//! Fixed-capacity lock-free data structures for bounded work queues.
//! The centerpiece is [`MpmcRing`], a multi-producer/multi-consumer circular
//! buffer with atomic cursors and power-of-two index masking. Operations
//! never block: a full ring rejects the push, an empty ring returns `None`.
#![warn(missing_docs)]

/// System constants
pub mod constants;

/// Core reusable data structures
pub mod structures;

// Re-export commonly used items
pub use structures::MpmcRing;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
