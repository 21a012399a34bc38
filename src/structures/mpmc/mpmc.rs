//! Bounded multi-producer multi-consumer ring buffer
//! - Lock-free, cache-friendly
//! - Any number of producer and consumer threads
//! - Capacity is normalized to a power of two in [16, 2^30]
//!
//! Two monotonic cursors define the occupied range: `head` counts slots
//! claimed for insertion, `tail` counts slots claimed for removal. A thread
//! claims a logical index with a CAS on its cursor and only then touches the
//! slot, so each index is written by exactly one producer and read by exactly
//! one consumer. Slots hold nullable pointers; null is the empty state, and
//! the pointer handoff is what publishes an element from producer to
//! consumer. Full and empty are expected outcomes, not errors.

use std::mem::size_of;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

use crate::constants::{MAX_RING_CAPACITY, MIN_RING_CAPACITY};

/// Round a requested capacity up to the next power of two, clamped to
/// `[MIN_RING_CAPACITY, MAX_RING_CAPACITY]`.
#[inline]
pub(crate) fn normalize_capacity(requested: usize) -> usize {
    requested
        .clamp(MIN_RING_CAPACITY, MAX_RING_CAPACITY)
        .next_power_of_two()
}

#[cfg(all(target_os = "macos", target_arch = "aarch64"))]
const CACHELINE: usize = 128;
#[cfg(not(all(target_os = "macos", target_arch = "aarch64")))]
const CACHELINE: usize = 64;
const PAD: usize = CACHELINE - size_of::<AtomicU64>();

/// Bounded MPMC ring buffer
#[repr(C)]
pub struct MpmcRing<T> {
    // Hot cursors on separate cache lines
    head: AtomicU64, // next write index (producers claim here)
    _pad_head: [u8; PAD],
    tail: AtomicU64, // next read index (consumers claim here)
    _pad_tail: [u8; PAD],
    // Cold config/data
    capacity: usize,
    mask: u64,
    slots: Box<[AtomicPtr<T>]>,
}

// SAFETY: the cursor CAS protocol gives each logical index exactly one
// writer and exactly one reader, and the slot pointer handoff is atomic.
unsafe impl<T: Send> Send for MpmcRing<T> {}
unsafe impl<T: Send> Sync for MpmcRing<T> {}

impl<T> MpmcRing<T> {
    /// Create a new ring. The requested capacity is rounded up to the next
    /// power of two and clamped to `[MIN_RING_CAPACITY, MAX_RING_CAPACITY]`;
    /// any input is accepted and normalized, never rejected.
    pub fn with_capacity(requested: usize) -> Self {
        let cap = normalize_capacity(requested);
        if cap != requested {
            tracing::debug!("ring capacity normalized from {} to {}", requested, cap);
        }

        let slots = (0..cap)
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            head: AtomicU64::new(0),
            _pad_head: [0u8; PAD],
            tail: AtomicU64::new(0),
            _pad_tail: [0u8; PAD],
            capacity: cap,
            mask: (cap - 1) as u64,
            slots,
        }
    }

    /// Try to push an item. Returns Err(item) if full; the caller keeps
    /// ownership and may retry or discard.
    ///
    /// The fullness check is a racy snapshot, but the CAS on `head` is the
    /// final arbiter: a stale snapshot only costs another loop iteration.
    #[inline(always)]
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            if head.wrapping_sub(tail) >= self.capacity as u64 {
                return Err(item);
            }
            match self.head.compare_exchange_weak(
                head,
                head.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                // Logical index `head` is now exclusively ours
                Ok(_) => break,
                Err(current) => {
                    head = current;
                    std::hint::spin_loop();
                }
            }
        }

        let slot = &self.slots[(head & self.mask) as usize];
        let ptr = Box::into_raw(Box::new(item));
        // A consumer lapped a full capacity behind may still be clearing
        // this slot. Publish with a CAS from null so a slow prior handoff is
        // waited out rather than overwritten.
        loop {
            match slot.compare_exchange_weak(
                ptr::null_mut(),
                ptr,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                // Publish the write
                Ok(_) => return Ok(()),
                Err(_) => std::hint::spin_loop(),
            }
        }
    }

    /// Try to pop an item. Returns None if empty.
    #[inline(always)]
    pub fn pop(&self) -> Option<T> {
        let mut tail = self.tail.load(Ordering::Acquire);
        loop {
            let head = self.head.load(Ordering::Acquire);
            if tail == head {
                return None;
            }
            match self.tail.compare_exchange_weak(
                tail,
                tail.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                // Logical index `tail` is now exclusively ours
                Ok(_) => break,
                Err(current) => {
                    tail = current;
                    std::hint::spin_loop();
                }
            }
        }

        let slot = &self.slots[(tail & self.mask) as usize];
        loop {
            // A null slot means the producer for this index has claimed but
            // not yet published; wait on a plain load rather than hammering
            // the line with RMWs.
            if slot.load(Ordering::Acquire).is_null() {
                std::hint::spin_loop();
                continue;
            }
            // Swap both takes the element and clears the slot, so the stored
            // pointer never outlives logical removal. A lapped consumer one
            // generation ahead can race this same physical slot, so a null
            // swap just re-enters the wait.
            let ptr = slot.swap(ptr::null_mut(), Ordering::AcqRel);
            if !ptr.is_null() {
                // SAFETY: the tail CAS made this index ours alone, and a
                // non-null pointer is one unique Box published by the one
                // producer that owned the index.
                return Some(unsafe { *Box::from_raw(ptr) });
            }
        }
    }

    /// Number of in-flight elements. A racy snapshot, advisory only under
    /// concurrency; reading the read cursor first keeps it non-negative.
    #[inline(always)]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        (head.wrapping_sub(tail) as usize).min(self.capacity)
    }

    /// Returns true if the ring is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail == head
    }

    /// Returns true if the ring is full.
    #[inline(always)]
    pub fn is_full(&self) -> bool {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail) >= self.capacity as u64
    }

    /// Normalized capacity of the ring.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total elements ever claimed for removal. Monotonic diagnostic.
    #[inline(always)]
    pub fn reads(&self) -> u64 {
        self.tail.load(Ordering::Acquire)
    }

    /// Total elements ever claimed for insertion. Monotonic diagnostic.
    #[inline(always)]
    pub fn writes(&self) -> u64 {
        self.head.load(Ordering::Acquire)
    }
}

impl<T> Drop for MpmcRing<T> {
    fn drop(&mut self) {
        for slot in self.slots.iter_mut() {
            let ptr = *slot.get_mut();
            if !ptr.is_null() {
                // SAFETY: &mut self means no thread is mid-handoff; every
                // non-null slot is an unclaimed Box we still own.
                drop(unsafe { Box::from_raw(ptr) });
            }
        }
    }
}
