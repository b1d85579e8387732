use std::cell::Cell;
use std::marker::PhantomData;
use std::num::NonZero;

use crate::{DEFAULT_ARENA_CAPACITY, DEFAULT_PAGE_SIZE, DropPolicy, MemoryPool, Result};

/// Builder for creating an instance of [`MemoryPool`].
///
/// All settings are optional. Without any configuration, the pool uses a page size of
/// [`DEFAULT_PAGE_SIZE`] (routing requests under 256 bytes to the arena) and an arena of
/// [`DEFAULT_ARENA_CAPACITY`].
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use memory_pool::MemoryPool;
///
/// let pool = MemoryPool::builder()
///     .page_size(NonZero::new(4096).unwrap())
///     .arena_capacity(NonZero::new(64 * 1024).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(pool.routing_threshold(), 1024);
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) and can be safely transferred between threads,
/// allowing pool configuration to happen on different threads than where the pool is used.
/// However, it is not thread-safe ([`Sync`]) as it contains mutable configuration state.
#[derive(Debug)]
#[must_use]
pub struct MemoryPoolBuilder {
    page_size: NonZero<usize>,
    arena_capacity: NonZero<usize>,
    drop_policy: DropPolicy,

    // Configuration is handed across threads by value, never shared.
    _not_sync: PhantomData<Cell<()>>,
}

impl MemoryPoolBuilder {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            arena_capacity: DEFAULT_ARENA_CAPACITY,
            drop_policy: DropPolicy::default(),
            _not_sync: PhantomData,
        }
    }

    /// Sets the page size of the storage engine the pool serves.
    ///
    /// Requests strictly smaller than a quarter of the page size are routed to the arena, all
    /// others to the heap. A page size under 4 bytes therefore routes everything to the heap.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZero;
    ///
    /// use memory_pool::MemoryPool;
    ///
    /// let pool = MemoryPool::builder()
    ///     .page_size(NonZero::new(2048).unwrap())
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(pool.routing_threshold(), 512);
    /// ```
    #[inline]
    pub fn page_size(mut self, page_size: NonZero<usize>) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the size of the arena backing buffer, which is allocated up front.
    ///
    /// Small requests that no longer fit into the buffer are served from the heap.
    #[inline]
    pub fn arena_capacity(mut self, capacity: NonZero<usize>) -> Self {
        self.arena_capacity = capacity;
        self
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how
    /// to treat live allocations when the pool is dropped.
    #[inline]
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the memory pool with the specified configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`][crate::Error::OutOfMemory] if the arena backing buffer
    /// cannot be allocated.
    pub fn build(self) -> Result<MemoryPool> {
        MemoryPool::new_inner(self.page_size, self.arena_capacity, self.drop_policy)
    }
}
