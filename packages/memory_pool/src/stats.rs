//! Point-in-time snapshots of pool accounting.

use std::fmt;

/// Accounting snapshot of one [`UsageTracker`][crate::UsageTracker].
///
/// Displays as `<allocated bytes>, <deallocated bytes>, <high-water mark>`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UsageStats {
    bytes_allocated: u64,
    bytes_deallocated: u64,
    high_water_mark: u64,
}

impl UsageStats {
    #[must_use]
    pub(crate) const fn new(
        bytes_allocated: u64,
        bytes_deallocated: u64,
        high_water_mark: u64,
    ) -> Self {
        Self {
            bytes_allocated,
            bytes_deallocated,
            high_water_mark,
        }
    }

    /// Total bytes ever allocated through the tracker.
    #[must_use]
    pub const fn bytes_allocated(&self) -> u64 {
        self.bytes_allocated
    }

    /// Total bytes ever deallocated through the tracker.
    #[must_use]
    pub const fn bytes_deallocated(&self) -> u64 {
        self.bytes_deallocated
    }

    /// Bytes allocated but not yet deallocated at the time of the snapshot.
    #[must_use]
    pub const fn bytes_in_use(&self) -> u64 {
        // Cannot underflow: every deallocated byte was allocated first.
        self.bytes_allocated.wrapping_sub(self.bytes_deallocated)
    }

    /// The largest value [`bytes_in_use()`](Self::bytes_in_use) has ever had.
    #[must_use]
    pub const fn high_water_mark(&self) -> u64 {
        self.high_water_mark
    }
}

impl fmt::Display for UsageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.bytes_allocated, self.bytes_deallocated, self.high_water_mark
        )
    }
}

/// Accounting snapshot of a whole [`MemoryPool`][crate::MemoryPool], one section per route.
///
/// The [`Display`](fmt::Display) form is the report returned by
/// [`MemoryPool::statistic()`][crate::MemoryPool::statistic]:
///
/// ```text
/// === stack allocation info ===
/// <allocated bytes>, <deallocated bytes>, <high-water mark>
/// === heap allocation info ===
/// <allocated bytes>, <deallocated bytes>, <high-water mark>
/// ```
///
/// The "stack" section covers small requests (arena and its overflow), the "heap" section
/// covers large requests.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolStats {
    small: UsageStats,
    large: UsageStats,
}

impl PoolStats {
    #[must_use]
    pub(crate) const fn new(small: UsageStats, large: UsageStats) -> Self {
        Self { small, large }
    }

    /// Accounting of the small-request path.
    #[must_use]
    pub const fn small(&self) -> UsageStats {
        self.small
    }

    /// Accounting of the large-request path.
    #[must_use]
    pub const fn large(&self) -> UsageStats {
        self.large
    }

    /// Total bytes ever allocated through either path.
    #[must_use]
    pub fn bytes_allocated(&self) -> u64 {
        self.small
            .bytes_allocated
            .checked_add(self.large.bytes_allocated)
            .expect("allocated byte total overflows u64 - this indicates an unrealistic scenario")
    }

    /// Total bytes ever deallocated through either path.
    #[must_use]
    pub fn bytes_deallocated(&self) -> u64 {
        self.small
            .bytes_deallocated
            .checked_add(self.large.bytes_deallocated)
            .expect("deallocated byte total overflows u64 - this indicates an unrealistic scenario")
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== stack allocation info ===")?;
        writeln!(f, "{}", self.small)?;
        writeln!(f, "=== heap allocation info ===")?;
        writeln!(f, "{}", self.large)
    }
}
