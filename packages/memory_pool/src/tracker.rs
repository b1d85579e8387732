//! Allocation accounting wrapper for memory resources.

use std::ptr::NonNull;

use crate::{MemoryResource, Result, UsageStats};

/// A [`MemoryResource`] wrapper that counts the bytes flowing through it.
///
/// The tracker forwards every call to its upstream resource and keeps three counters:
///
/// * bytes allocated (cumulative, only ever increases),
/// * bytes deallocated (cumulative, only ever increases),
/// * the high-water mark of bytes in use (allocated minus deallocated).
///
/// Counters only change once the upstream call has succeeded, so a failed allocation leaves no
/// trace in the accounting.
///
/// # Examples
///
/// ```
/// use memory_pool::{Heap, MemoryResource, UsageTracker};
///
/// let mut tracker = UsageTracker::new(Heap::new());
///
/// let a = tracker.allocate(100).unwrap();
/// let b = tracker.allocate(50).unwrap();
///
/// // SAFETY: Allocated above with the same size, not yet deallocated.
/// unsafe { tracker.deallocate(a, 100) };
///
/// assert_eq!(tracker.bytes_allocated(), 150);
/// assert_eq!(tracker.bytes_deallocated(), 100);
/// assert_eq!(tracker.high_water_mark(), 150);
///
/// // SAFETY: Allocated above with the same size, not yet deallocated.
/// unsafe { tracker.deallocate(b, 50) };
/// ```
#[derive(Debug)]
pub struct UsageTracker<U> {
    upstream: U,

    bytes_allocated: u64,
    bytes_deallocated: u64,
    high_water_mark: u64,
}

impl<U: MemoryResource> UsageTracker<U> {
    /// Creates a tracker with all counters at zero that forwards to `upstream`.
    #[must_use]
    #[inline]
    pub const fn new(upstream: U) -> Self {
        Self {
            upstream,
            bytes_allocated: 0,
            bytes_deallocated: 0,
            high_water_mark: 0,
        }
    }

    /// Total bytes ever allocated through this tracker.
    #[must_use]
    #[inline]
    pub const fn bytes_allocated(&self) -> u64 {
        self.bytes_allocated
    }

    /// Total bytes ever deallocated through this tracker.
    #[must_use]
    #[inline]
    pub const fn bytes_deallocated(&self) -> u64 {
        self.bytes_deallocated
    }

    /// Bytes currently allocated and not yet deallocated.
    #[must_use]
    #[inline]
    pub const fn bytes_in_use(&self) -> u64 {
        // Cannot underflow: deallocations are only counted for blocks counted as allocated.
        self.bytes_allocated.wrapping_sub(self.bytes_deallocated)
    }

    /// The largest number of bytes that have been in use at the same time.
    #[must_use]
    #[inline]
    pub const fn high_water_mark(&self) -> u64 {
        self.high_water_mark
    }

    /// Takes a snapshot of the counters.
    #[must_use]
    pub const fn stats(&self) -> UsageStats {
        UsageStats::new(
            self.bytes_allocated,
            self.bytes_deallocated,
            self.high_water_mark,
        )
    }

    /// Sets all counters back to zero.
    ///
    /// This does not touch the upstream resource. Intended for use when the caller knows that no
    /// blocks obtained through this tracker are still live, otherwise the counters stop adding up.
    pub fn clear(&mut self) {
        self.bytes_allocated = 0;
        self.bytes_deallocated = 0;
        self.high_water_mark = 0;
    }

    /// The resource this tracker forwards to.
    #[must_use]
    pub const fn upstream(&self) -> &U {
        &self.upstream
    }

    /// The resource this tracker forwards to.
    ///
    /// Blocks allocated or deallocated directly through this reference bypass the accounting.
    #[must_use]
    pub fn upstream_mut(&mut self) -> &mut U {
        &mut self.upstream
    }

    fn record_allocation(&mut self, size: u64) {
        self.bytes_allocated = self
            .bytes_allocated
            .checked_add(size)
            .expect("allocated byte count overflows u64 - this indicates an unrealistic scenario");

        self.high_water_mark = self.high_water_mark.max(self.bytes_in_use());
    }

    fn record_deallocation(&mut self, size: u64) {
        self.bytes_deallocated = self
            .bytes_deallocated
            .checked_add(size)
            .expect("deallocated byte count overflows u64 - this indicates an unrealistic scenario");

        debug_assert!(
            self.bytes_deallocated <= self.bytes_allocated,
            "deallocated {} bytes in total but only {} were ever allocated",
            self.bytes_deallocated,
            self.bytes_allocated
        );
    }
}

impl<U: MemoryResource> MemoryResource for UsageTracker<U> {
    #[inline]
    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>> {
        let ptr = self.upstream.allocate(size)?;

        self.record_allocation(size.try_into().expect("usize always fits into u64"));

        Ok(ptr)
    }

    #[inline]
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, size: usize) {
        // SAFETY: Forwarding safety requirements to the caller. We hand out exactly the
        // pointers our upstream hands out, so the pair is valid for the upstream as well.
        unsafe {
            self.upstream.deallocate(ptr, size);
        }

        self.record_deallocation(size.try_into().expect("usize always fits into u64"));
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{Error, Heap};

    assert_impl_all!(UsageTracker<Heap>: Send, Sync, std::fmt::Debug);

    /// Fails every allocation, like a heap that has run dry.
    #[derive(Debug)]
    struct ExhaustedResource;

    impl MemoryResource for ExhaustedResource {
        fn allocate(&mut self, size: usize) -> Result<NonNull<u8>> {
            Err(Error::OutOfMemory { size })
        }

        unsafe fn deallocate(&mut self, _ptr: NonNull<u8>, _size: usize) {
            unreachable!("nothing was ever allocated");
        }
    }

    #[test]
    fn starts_at_zero() {
        let tracker = UsageTracker::new(Heap::new());

        assert_eq!(tracker.stats(), UsageStats::default());
        assert_eq!(tracker.bytes_in_use(), 0);
    }

    #[test]
    fn counts_allocations_and_deallocations() {
        let mut tracker = UsageTracker::new(Heap::new());

        let blocks = (1..=10_usize)
            .map(|size| (tracker.allocate(size).unwrap(), size))
            .collect::<Vec<_>>();

        assert_eq!(tracker.bytes_allocated(), 55);
        assert_eq!(tracker.bytes_deallocated(), 0);
        assert_eq!(tracker.high_water_mark(), 55);

        for (ptr, size) in blocks {
            // SAFETY: Allocated above with the same size, not yet deallocated.
            unsafe { tracker.deallocate(ptr, size) };
        }

        assert_eq!(tracker.bytes_allocated(), 55);
        assert_eq!(tracker.bytes_deallocated(), 55);
        assert_eq!(tracker.bytes_in_use(), 0);
        assert_eq!(tracker.high_water_mark(), 55);
    }

    #[test]
    fn high_water_mark_tracks_peak_in_use() {
        let mut tracker = UsageTracker::new(Heap::new());
        let mut peak: u64 = 0;

        let a = tracker.allocate(100).unwrap();
        let b = tracker.allocate(200).unwrap();
        peak = peak.max(tracker.bytes_in_use());

        // SAFETY: Allocated above with the same size, not yet deallocated.
        unsafe { tracker.deallocate(b, 200) };
        assert_eq!(tracker.high_water_mark(), 300);

        let c = tracker.allocate(150).unwrap();
        peak = peak.max(tracker.bytes_in_use());

        // Peak in use was 300 even though 450 bytes were allocated in total.
        assert_eq!(tracker.bytes_allocated(), 450);
        assert_eq!(tracker.high_water_mark(), peak);
        assert_eq!(tracker.high_water_mark(), 300);

        let d = tracker.allocate(400).unwrap();
        assert_eq!(tracker.high_water_mark(), 650);

        // SAFETY: Allocated above with the same sizes, not yet deallocated.
        unsafe {
            tracker.deallocate(a, 100);
            tracker.deallocate(c, 150);
            tracker.deallocate(d, 400);
        }

        assert_eq!(tracker.high_water_mark(), 650);
    }

    #[test]
    fn failed_allocation_is_not_counted() {
        let mut tracker = UsageTracker::new(ExhaustedResource);

        let result = tracker.allocate(64);

        assert!(matches!(result, Err(Error::OutOfMemory { size: 64 })));
        assert_eq!(tracker.stats(), UsageStats::default());
    }

    #[test]
    fn clear_resets_counters() {
        let mut tracker = UsageTracker::new(Heap::new());

        let ptr = tracker.allocate(32).unwrap();
        // SAFETY: Allocated above with the same size, not yet deallocated.
        unsafe { tracker.deallocate(ptr, 32) };

        tracker.clear();

        assert_eq!(tracker.stats(), UsageStats::default());
    }

    #[test]
    fn trackers_stack() {
        let mut outer = UsageTracker::new(UsageTracker::new(Heap::new()));

        let ptr = outer.allocate(128).unwrap();

        assert_eq!(outer.bytes_allocated(), 128);
        assert_eq!(outer.upstream().bytes_allocated(), 128);

        // SAFETY: Allocated above with the same size, not yet deallocated.
        unsafe { outer.deallocate(ptr, 128) };

        assert_eq!(outer.upstream().bytes_deallocated(), 128);
    }
}
