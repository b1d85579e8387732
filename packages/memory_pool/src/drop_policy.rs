/// Determines what happens to live allocations when a [`MemoryPool`][crate::MemoryPool] is dropped.
///
/// By default, the pool releases all its memory when it is dropped, including blocks that were
/// never deallocated.
///
/// # Examples
///
/// ```
/// use memory_pool::{DropPolicy, MemoryPool};
///
/// // The drop policy is set at pool creation time.
/// let pool = MemoryPool::builder()
///     .drop_policy(DropPolicy::MustNotHoldAllocations)
///     .build()
///     .unwrap();
///
/// let block = pool.allocate(64).unwrap();
/// pool.deallocate(block, 64).unwrap();
///
/// // Nothing is live anymore, so dropping the pool is fine.
/// drop(pool);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool releases live allocations when it is dropped. This is the default.
    ///
    /// Any pointers the caller still holds are dangling afterwards.
    #[default]
    MayReleaseAllocations,

    /// The pool will panic if it still has live allocations when it is dropped.
    ///
    /// This may be valuable to catch leaks, e.g. a buffer that a storage engine forgot to return
    /// before shutting down. The memory is still released before the panic.
    MustNotHoldAllocations,
}
