//! Bump-pointer arena with upstream overflow.

use std::num::NonZero;
use std::ptr::NonNull;

use crate::{DEFAULT_ALIGNMENT, Error, MemoryResource, Result};

/// A bump-pointer [`MemoryResource`] over a fixed-capacity buffer.
///
/// Each allocation advances an offset into the buffer, rounded up to
/// [`DEFAULT_ALIGNMENT`]. When the remaining capacity cannot hold a request, the request is
/// served by the upstream resource instead. Such overflow blocks do not consume arena capacity,
/// so an arena under pressure quietly turns into a pass-through to its upstream.
///
/// Deallocating a block from the buffer is a no-op: the offset never moves backwards. Buffer
/// memory becomes reusable only through [`reset()`](Self::reset) or by dropping the arena.
/// Deallocating an overflow block returns it to the upstream resource immediately.
///
/// The backing buffer itself is obtained from the upstream resource when the arena is created
/// and returned to it when the arena is dropped.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use memory_pool::{Arena, Heap, MemoryResource};
///
/// let mut arena = Arena::new(NonZero::new(64).unwrap(), Heap::new()).unwrap();
///
/// let first = arena.allocate(10).unwrap();
/// let second = arena.allocate(10).unwrap();
///
/// assert!(arena.contains(first));
/// assert!(arena.contains(second));
/// assert_eq!(arena.used(), 26);
///
/// // Does not fit into the remaining 38 bytes, so it comes from the heap.
/// let overflow = arena.allocate(48).unwrap();
/// assert!(!arena.contains(overflow));
///
/// // SAFETY: All blocks were allocated above with the same sizes, not yet deallocated.
/// unsafe {
///     arena.deallocate(first, 10);
///     arena.deallocate(second, 10);
///     arena.deallocate(overflow, 48);
/// }
///
/// // Deallocation did not give anything back to the buffer.
/// assert_eq!(arena.used(), 26);
///
/// // SAFETY: No blocks from the buffer are live anymore.
/// unsafe { arena.reset() };
/// assert_eq!(arena.used(), 0);
/// ```
///
/// # Thread safety
///
/// The arena is thread-mobile ([`Send`]) if its upstream is, but it is not thread-safe
/// ([`Sync`]). Share it between threads only behind a lock.
#[derive(Debug)]
pub struct Arena<U: MemoryResource> {
    upstream: U,

    /// Start of the backing buffer, allocated from `upstream` with size `capacity`.
    buffer: NonNull<u8>,

    capacity: NonZero<usize>,

    /// Bytes of the buffer consumed so far, including alignment padding.
    /// Never exceeds `capacity`.
    offset: usize,
}

impl<U: MemoryResource> Arena<U> {
    /// Creates an arena with a backing buffer of `capacity` bytes obtained from `upstream`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the upstream resource cannot provide the buffer.
    pub fn new(capacity: NonZero<usize>, mut upstream: U) -> Result<Self> {
        let buffer = upstream.allocate(capacity.get())?;

        Ok(Self {
            upstream,
            buffer,
            capacity,
            offset: 0,
        })
    }

    /// Size of the backing buffer in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Bytes of the backing buffer consumed so far, including alignment padding.
    #[must_use]
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Bytes of the backing buffer not yet consumed.
    ///
    /// Not all of these may be usable, as each allocation starts at an aligned offset.
    #[must_use]
    pub fn remaining(&self) -> usize {
        // Cannot underflow: the offset never exceeds the capacity.
        self.capacity.get().wrapping_sub(self.offset)
    }

    /// Whether `ptr` points into the backing buffer, as opposed to an overflow block.
    #[must_use]
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        let start = self.buffer.as_ptr().addr();
        let address = ptr.as_ptr().addr();

        // Cannot underflow because we checked the order first.
        address >= start && address.wrapping_sub(start) < self.capacity.get()
    }

    /// The resource that provides the backing buffer and serves overflow requests.
    #[must_use]
    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// Rewinds the arena so the whole backing buffer can be handed out again.
    ///
    /// Overflow blocks are not affected; they are returned to the upstream resource one by one
    /// as they are deallocated.
    ///
    /// # Safety
    ///
    /// The caller must ensure that no block handed out from the backing buffer is still in use,
    /// as the same memory will be handed out again.
    pub unsafe fn reset(&mut self) {
        tracing::debug!(
            used = self.offset,
            capacity = self.capacity.get(),
            "rewinding arena"
        );

        self.offset = 0;
    }

    /// Claims `size` bytes of the backing buffer, returning the offset of the claimed range.
    ///
    /// Returns `None` if the remaining capacity cannot hold the request.
    fn bump(&mut self, size: usize) -> Option<usize> {
        let start = self.offset.checked_next_multiple_of(DEFAULT_ALIGNMENT)?;
        let end = start.checked_add(size)?;

        if end > self.capacity.get() {
            return None;
        }

        self.offset = end;
        Some(start)
    }
}

impl<U: MemoryResource> MemoryResource for Arena<U> {
    #[inline]
    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>> {
        if size == 0 {
            return Err(Error::zero_sized());
        }

        if let Some(start) = self.bump(size) {
            // SAFETY: bump() guarantees start + size <= capacity, so the result stays within
            // the backing buffer allocation.
            return Ok(unsafe { self.buffer.add(start) });
        }

        tracing::debug!(
            size,
            used = self.offset,
            capacity = self.capacity.get(),
            "arena exhausted, serving request from upstream"
        );

        self.upstream.allocate(size)
    }

    #[inline]
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, size: usize) {
        if self.contains(ptr) {
            // Buffer memory is only reclaimed in bulk.
            return;
        }

        // SAFETY: The caller guarantees that we handed out this block. Since it is not from our
        // buffer, it is an overflow block that the upstream allocated with the same size.
        unsafe {
            self.upstream.deallocate(ptr, size);
        }
    }
}

impl<U: MemoryResource> Drop for Arena<U> {
    #[cfg_attr(test, mutants::skip)] // Mutating this away only leaks the buffer, which tests cannot observe outside Miri.
    fn drop(&mut self) {
        // SAFETY: The buffer was allocated from upstream with this exact size in new() and
        // is only ever returned here.
        unsafe {
            self.upstream.deallocate(self.buffer, self.capacity.get());
        }
    }
}

// SAFETY: The arena exclusively owns its backing buffer and only hands out pointers into it.
// It never dereferences those pointers and keeps no thread-local state, so moving it to another
// thread is as safe as moving its upstream resource.
unsafe impl<U: MemoryResource + Send> Send for Arena<U> {}
