use std::ptr::NonNull;

use crate::Result;

/// A source of raw memory blocks.
///
/// This is the seam between the building blocks of the pool: a [`UsageTracker`][crate::UsageTracker]
/// wraps any resource, an [`Arena`][crate::Arena] falls back to another resource when its buffer
/// is exhausted and the [`Heap`][crate::Heap] ends the chain by calling the global allocator.
///
/// Every block handed out is aligned to [`DEFAULT_ALIGNMENT`][crate::DEFAULT_ALIGNMENT] and is
/// at least as large as requested.
pub trait MemoryResource {
    /// Allocates a block of at least `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`][crate::Error::OutOfMemory] if the resource cannot provide
    /// the block and [`Error::InvalidArgument`][crate::Error::InvalidArgument] if `size` is zero.
    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>>;

    /// Returns a block to the resource.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate(size)` on this same resource, with the same
    /// `size`, and must not have been deallocated since. The caller must not access the block
    /// after this call.
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, size: usize);
}
