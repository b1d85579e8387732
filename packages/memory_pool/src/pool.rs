use std::num::NonZero;
use std::ptr::NonNull;
use std::sync::{Mutex, PoisonError};
use std::thread;

use crate::constants::ERR_POISONED_LOCK;
use crate::{
    AllocationLedger, Arena, DropPolicy, Error, Heap, MemoryPoolBuilder, MemoryResource,
    PoolStats, Result, UsageTracker,
};

/// The path a request takes through a [`MemoryPool`], decided by its size alone.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a request is either small or large, there is no third path to add later"
)]
pub enum Route {
    /// Served from the arena, or from the heap via arena overflow.
    Small,

    /// Served from the heap.
    Large,
}

impl Route {
    fn for_size(size: usize, routing_threshold: usize) -> Self {
        if size < routing_threshold {
            Self::Small
        } else {
            Self::Large
        }
    }
}

/// A size-routed memory pool for short-lived byte buffers.
///
/// Small requests (under a quarter of the configured page size) are served from a bump-pointer
/// [`Arena`], large requests from the [`Heap`]. Each path has its own [`UsageTracker`], so the
/// pool can report accounting per path as well as in total.
///
/// When the arena runs out of space, small requests are served from the heap. They are still
/// counted as small and still routed as small on deallocation.
///
/// # Deallocation contract
///
/// [`deallocate()`](Self::deallocate) accepts only the exact `(pointer, size)` pair returned by a
/// live allocation. The pool checks every pair against a ledger of live allocations and returns
/// [`Error::InvalidArgument`] on a mismatch, leaving its state untouched.
///
/// Deallocating a block served from the arena buffer only updates the accounting. The buffer is
/// rewound by [`reset()`](Self::reset), which requires that no allocation is live.
///
/// # Examples
///
/// ```
/// use memory_pool::MemoryPool;
///
/// let pool = MemoryPool::builder().build().unwrap();
///
/// let ptrs = (1..=10)
///     .map(|size| (pool.allocate(size).unwrap(), size))
///     .collect::<Vec<_>>();
///
/// assert_eq!(pool.bytes_allocated(), 55);
/// assert_eq!(pool.stats().small().bytes_allocated(), 55);
///
/// for (ptr, size) in ptrs {
///     pool.deallocate(ptr, size).unwrap();
/// }
///
/// // Deallocating the same block twice is caught.
/// let ptr = pool.allocate(300).unwrap();
/// pool.deallocate(ptr, 300).unwrap();
/// assert!(pool.deallocate(ptr, 300).is_err());
/// ```
///
/// # Thread safety
///
/// The pool is thread-safe ([`Send`] and [`Sync`]). Every operation takes an internal lock once,
/// so concurrent callers are serialized. Share the pool between threads via a reference or an
/// [`Arc`](std::sync::Arc).
#[derive(Debug)]
pub struct MemoryPool {
    state: Mutex<PoolState>,

    page_size: NonZero<usize>,

    /// Requests strictly smaller than this are small. Derived from the page size.
    routing_threshold: usize,

    drop_policy: DropPolicy,
}

#[derive(Debug)]
struct PoolState {
    small: UsageTracker<Arena<Heap>>,
    large: UsageTracker<Heap>,
    ledger: AllocationLedger,
}

impl MemoryPool {
    /// Creates a builder for configuring and constructing a [`MemoryPool`].
    #[inline]
    pub fn builder() -> MemoryPoolBuilder {
        MemoryPoolBuilder::new()
    }

    pub(crate) fn new_inner(
        page_size: NonZero<usize>,
        arena_capacity: NonZero<usize>,
        drop_policy: DropPolicy,
    ) -> Result<Self> {
        #[expect(
            clippy::integer_division,
            reason = "the threshold is defined as a whole quarter of a page"
        )]
        let routing_threshold = page_size.get() / 4;

        let arena = Arena::new(arena_capacity, Heap::new())?;

        tracing::debug!(
            page_size = page_size.get(),
            routing_threshold,
            arena_capacity = arena_capacity.get(),
            "created memory pool"
        );

        Ok(Self {
            state: Mutex::new(PoolState {
                small: UsageTracker::new(arena),
                large: UsageTracker::new(Heap::new()),
                ledger: AllocationLedger::new(),
            }),
            page_size,
            routing_threshold,
            drop_policy,
        })
    }

    /// The configured page size.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    /// Requests strictly smaller than this many bytes are routed to the arena.
    #[must_use]
    pub fn routing_threshold(&self) -> usize {
        self.routing_threshold
    }

    /// The path a request of `size` bytes takes through this pool.
    #[must_use]
    pub fn route(&self, size: usize) -> Route {
        Route::for_size(size, self.routing_threshold)
    }

    /// Allocates a block of at least `size` bytes, aligned to
    /// [`DEFAULT_ALIGNMENT`][crate::DEFAULT_ALIGNMENT].
    ///
    /// The block is uninitialized and stays valid until it is passed to
    /// [`deallocate()`](Self::deallocate) or the pool is reset or dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the block cannot be provided and
    /// [`Error::InvalidArgument`] if `size` is zero. Failed requests are not counted.
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        let route = self.route(size);

        let mut guard = self.state.lock().expect(ERR_POISONED_LOCK);
        let state = &mut *guard;

        let ptr = match route {
            Route::Small => state.small.allocate(size)?,
            Route::Large => state.large.allocate(size)?,
        };

        state.ledger.record(ptr, size);

        tracing::trace!(size, ?route, "allocated block");

        Ok(ptr)
    }

    /// Returns a block to the pool.
    ///
    /// `ptr` and `size` must be exactly the pointer returned by [`allocate()`](Self::allocate)
    /// and the size passed to it. The caller must not access the block afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the pair does not match a live allocation of this
    /// pool: the pointer was never allocated here, was already deallocated, or was allocated with
    /// a different size. Nothing changes in the pool in that case.
    pub fn deallocate(&self, ptr: NonNull<u8>, size: usize) -> Result<()> {
        let route = self.route(size);

        let mut guard = self.state.lock().expect(ERR_POISONED_LOCK);
        let state = &mut *guard;

        if let Err(error) = state.ledger.release(ptr, size) {
            tracing::warn!(%error, "rejected deallocation");
            return Err(error);
        }

        // SAFETY: The ledger confirmed that this exact pair was live. Routing depends only on
        // the size, so the pair goes back to the same tracker that allocated it.
        unsafe {
            match route {
                Route::Small => state.small.deallocate(ptr, size),
                Route::Large => state.large.deallocate(ptr, size),
            }
        }

        tracing::trace!(size, ?route, "deallocated block");

        Ok(())
    }

    /// Total bytes ever allocated through the pool, across both paths.
    #[must_use]
    pub fn bytes_allocated(&self) -> u64 {
        self.stats().bytes_allocated()
    }

    /// Total bytes ever deallocated through the pool, across both paths.
    #[must_use]
    pub fn bytes_deallocated(&self) -> u64 {
        self.stats().bytes_deallocated()
    }

    /// Takes a snapshot of the accounting of both paths.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock().expect(ERR_POISONED_LOCK);

        PoolStats::new(state.small.stats(), state.large.stats())
    }

    /// Renders the accounting of both paths as a human-readable report.
    ///
    /// ```text
    /// === stack allocation info ===
    /// <allocated bytes>, <deallocated bytes>, <high-water mark>
    /// === heap allocation info ===
    /// <allocated bytes>, <deallocated bytes>, <high-water mark>
    /// ```
    #[must_use]
    pub fn statistic(&self) -> String {
        self.stats().to_string()
    }

    /// Number of allocations that have not been deallocated yet.
    #[must_use]
    pub fn live_allocations(&self) -> usize {
        self.state.lock().expect(ERR_POISONED_LOCK).ledger.len()
    }

    /// Size of the arena backing buffer.
    #[must_use]
    pub fn arena_capacity(&self) -> usize {
        self.state
            .lock()
            .expect(ERR_POISONED_LOCK)
            .small
            .upstream()
            .capacity()
    }

    /// Bytes of the arena backing buffer consumed since creation or the last reset.
    ///
    /// Deallocation does not lower this value.
    #[must_use]
    pub fn arena_used(&self) -> usize {
        self.state
            .lock()
            .expect(ERR_POISONED_LOCK)
            .small
            .upstream()
            .used()
    }

    /// Reclaims the arena buffer and sets all accounting back to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LiveAllocations`] if any allocation has not been deallocated yet. The
    /// pool is left unchanged in that case.
    pub fn reset(&self) -> Result<()> {
        let mut guard = self.state.lock().expect(ERR_POISONED_LOCK);
        let state = &mut *guard;

        if !state.ledger.is_empty() {
            return Err(Error::LiveAllocations {
                count: state.ledger.len(),
            });
        }

        // SAFETY: The ledger is empty, so no block from the arena buffer is live.
        unsafe {
            state.small.upstream_mut().reset();
        }

        state.small.clear();
        state.large.clear();

        tracing::debug!("memory pool reset");

        Ok(())
    }
}

impl Drop for MemoryPool {
    fn drop(&mut self) {
        let routing_threshold = self.routing_threshold;

        // If the lock is poisoned, we still want to release the memory.
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);

        let PoolState {
            small,
            large,
            ledger,
        } = state;

        let live_count = ledger.len();

        for (ptr, size) in ledger.drain() {
            // SAFETY: Every block in the ledger is live and was allocated by the tracker its
            // size routes to. The drop policy makes the caller responsible for not using it.
            unsafe {
                match Route::for_size(size, routing_threshold) {
                    Route::Small => small.deallocate(ptr, size),
                    Route::Large => large.deallocate(ptr, size),
                }
            }
        }

        if live_count != 0 {
            tracing::debug!(live_count, "released live allocations of dropped pool");
        }

        // We do this check at the end so we clean up the memory first.
        //
        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if !thread::panicking() && matches!(self.drop_policy, DropPolicy::MustNotHoldAllocations)
        {
            assert!(
                live_count == 0,
                "dropped a MemoryPool with {live_count} live allocations - this is forbidden by DropPolicy::MustNotHoldAllocations"
            );
        }
    }
}
