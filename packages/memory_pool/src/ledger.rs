use std::ptr::NonNull;

use foldhash::{HashMap, HashMapExt};

use crate::{Error, Result};

/// Record of every live allocation handed out by a pool, keyed by address.
///
/// The ledger is what lets the pool reject deallocations that do not match a live allocation,
/// which would otherwise corrupt the accounting or, for heap blocks, the heap itself.
#[derive(Debug)]
pub(crate) struct AllocationLedger {
    /// We use foldhash for better performance with small hash tables.
    live: HashMap<usize, LiveBlock>,
}

#[derive(Clone, Copy, Debug)]
struct LiveBlock {
    ptr: NonNull<u8>,
    size: usize,
}

impl AllocationLedger {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            live: HashMap::new(),
        }
    }

    /// Number of live allocations.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Records a freshly allocated block.
    ///
    /// # Panics
    ///
    /// Panics if the address is already live. A resource handing out the same memory twice means
    /// the pool state is corrupted.
    pub(crate) fn record(&mut self, ptr: NonNull<u8>, size: usize) {
        let address = ptr.as_ptr().addr();

        let previous = self.live.insert(address, LiveBlock { ptr, size });

        assert!(
            previous.is_none(),
            "block at {address:#x} was handed out while still live"
        );
    }

    /// Removes the record of a block that is being deallocated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if no live allocation starts at `ptr` or if it was
    /// allocated with a different size. The ledger is left unchanged in that case.
    pub(crate) fn release(&mut self, ptr: NonNull<u8>, size: usize) -> Result<()> {
        let address = ptr.as_ptr().addr();

        let Some(block) = self.live.get(&address) else {
            return Err(Error::InvalidArgument {
                address,
                size,
                problem: "not a live allocation (never allocated or already deallocated)"
                    .to_string(),
            });
        };

        if block.size != size {
            return Err(Error::InvalidArgument {
                address,
                size,
                problem: format!("block was allocated with size {}", block.size),
            });
        }

        self.live.remove(&address);
        Ok(())
    }

    /// Removes all records, returning the blocks they describe.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (NonNull<u8>, usize)> {
        self.live.drain().map(|(_, block)| (block.ptr, block.size))
    }
}

// SAFETY: The ledger stores pointers purely as records to hand back to their resource. It never
// dereferences them, so there is nothing thread-specific about holding them.
unsafe impl Send for AllocationLedger {}
