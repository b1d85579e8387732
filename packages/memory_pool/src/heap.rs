use std::alloc::{Layout, alloc, dealloc};
use std::ptr::NonNull;

use crate::{DEFAULT_ALIGNMENT, Error, MemoryResource, Result};

/// A [`MemoryResource`] that delegates every call to the global allocator.
///
/// The heap keeps no bookkeeping of its own. Each deallocation releases its block immediately.
///
/// # Examples
///
/// ```
/// use memory_pool::{Heap, MemoryResource};
///
/// let mut heap = Heap::new();
///
/// let block = heap.allocate(4096).unwrap();
///
/// // SAFETY: The block was just allocated by this heap with the same size.
/// unsafe { heap.deallocate(block, 4096) };
/// ```
#[derive(Clone, Copy, Debug, Default)]
#[non_exhaustive]
pub struct Heap;

impl Heap {
    /// Creates a new heap resource.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

/// Layout of a block of `size` bytes as handed out by the heap.
fn block_layout(size: usize) -> Result<Layout> {
    if size == 0 {
        return Err(Error::zero_sized());
    }

    // The only way this fails is a size so large that no allocator could ever satisfy it.
    Layout::from_size_align(size, DEFAULT_ALIGNMENT)
        .map_err(|_layout_error| Error::OutOfMemory { size })
}

impl MemoryResource for Heap {
    #[inline]
    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>> {
        let layout = block_layout(size)?;

        // SAFETY: block_layout() never returns a zero-sized layout.
        let ptr = unsafe { alloc(layout) };

        NonNull::new(ptr).ok_or(Error::OutOfMemory { size })
    }

    #[inline]
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, size: usize) {
        let layout = block_layout(size)
            .expect("the caller guarantees this size was accepted by allocate() before");

        // SAFETY: The caller guarantees that ptr was allocated by us with the same size, which
        // means the same layout, and that it has not been deallocated yet.
        unsafe {
            dealloc(ptr.as_ptr(), layout);
        }
    }
}
