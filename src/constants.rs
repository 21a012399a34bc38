//! Global constants used throughout the workring codebase
//!
//! This module contains compile-time constants that are shared across
//! multiple modules to ensure consistency and avoid magic numbers.

/// Smallest ring capacity handed out by construction (16 slots)
///
/// Requests below this are rounded up. A floor this size keeps the
/// claim/handoff window wide enough that producers and consumers are not
/// permanently camped on the same cache line.
pub const MIN_RING_CAPACITY: usize = 16;

/// Largest ring capacity handed out by construction (2^30 slots)
///
/// Requests above this are rounded down. The ceiling keeps `capacity`
/// comfortably inside the range where `next_power_of_two` cannot overflow
/// and a fully populated ring stays addressable on 32-bit targets.
pub const MAX_RING_CAPACITY: usize = 1 << 30;
