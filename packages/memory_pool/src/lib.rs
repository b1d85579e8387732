#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A size-routed memory pool for short-lived byte buffers.
//!
//! [`MemoryPool`] hands out raw memory blocks without calling the general-purpose allocator on
//! every request. Each request is routed by its size:
//!
//! * Requests smaller than a quarter of the configured page size are *small* and are served from
//!   a bump-pointer [`Arena`] over a fixed-capacity buffer. Once the buffer is exhausted, small
//!   requests are quietly served by the heap instead, still counted as small.
//! * All other requests are *large* and go straight to the [`Heap`].
//!
//! Both paths are wrapped in a [`UsageTracker`] that counts allocated and deallocated bytes and
//! remembers the high-water mark of bytes in use.
//!
//! # Example
//!
//! ```
//! use memory_pool::MemoryPool;
//!
//! let pool = MemoryPool::builder().build().unwrap();
//!
//! let small = pool.allocate(100).unwrap();
//! let large = pool.allocate(4000).unwrap();
//!
//! assert_eq!(pool.bytes_allocated(), 4100);
//!
//! pool.deallocate(small, 100).unwrap();
//! pool.deallocate(large, 4000).unwrap();
//!
//! assert_eq!(pool.bytes_deallocated(), 4100);
//!
//! println!("{}", pool.statistic());
//! ```
//!
//! # Deallocation contract
//!
//! A deallocation must present exactly the `(pointer, size)` pair returned by an earlier
//! allocation that has not yet been deallocated. The pool keeps a ledger of live allocations and
//! rejects anything else with [`Error::InvalidArgument`], including double frees and size
//! mismatches.
//!
//! Deallocating a small block only updates accounting, unless the block came from arena overflow.
//! Arena memory is reclaimed in bulk by [`MemoryPool::reset()`] or when the pool is dropped.
//!
//! # Thread safety
//!
//! [`MemoryPool`] is thread-safe. All mutable state is guarded by one lock that every operation
//! takes once, so concurrent callers are serialized. The building blocks ([`Arena`], [`Heap`],
//! [`UsageTracker`]) are thread-mobile but take `&mut self` and are meant to be owned by one
//! thread at a time.

mod arena;
mod builder;
mod constants;
mod drop_policy;
mod error;
mod heap;
mod ledger;
mod pool;
mod resource;
mod stats;
mod tracker;

pub use arena::Arena;
pub use builder::MemoryPoolBuilder;
pub use constants::{DEFAULT_ALIGNMENT, DEFAULT_ARENA_CAPACITY, DEFAULT_PAGE_SIZE};
pub use drop_policy::DropPolicy;
pub use error::{Error, Result};
pub use heap::Heap;
pub(crate) use ledger::AllocationLedger;
pub use pool::{MemoryPool, Route};
pub use resource::MemoryResource;
pub use stats::{PoolStats, UsageStats};
pub use tracker::UsageTracker;
