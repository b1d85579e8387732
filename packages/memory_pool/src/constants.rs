use std::num::NonZero;

/// Page size used to derive the routing threshold when none is configured.
///
/// Requests smaller than a quarter of the page size are served from the arena.
pub const DEFAULT_PAGE_SIZE: NonZero<usize> = NonZero::new(1 << 10).expect("1024 is not zero");

/// Capacity of the arena backing buffer when none is configured (1 MiB).
pub const DEFAULT_ARENA_CAPACITY: NonZero<usize> =
    NonZero::new(1 << 20).expect("1 MiB is not zero");

/// Alignment of every block handed out by the pool and its building blocks.
///
/// This matches the strictest alignment of the primitive types on common 64-bit targets.
pub const DEFAULT_ALIGNMENT: usize = 16;

pub(crate) const ERR_POISONED_LOCK: &str =
    "encountered poisoned lock - the pool state can no longer be trusted";
