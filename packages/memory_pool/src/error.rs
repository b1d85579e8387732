use thiserror::Error;

/// Errors that can occur when allocating from or returning memory to the pool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The memory resource that the request was routed to could not provide a block of the
    /// requested size. The pool does not retry; the caller decides whether to back off or abort.
    #[error("out of memory: could not allocate a block of {size} bytes")]
    OutOfMemory {
        /// Size of the request that could not be satisfied.
        size: usize,
    },

    /// The caller violated the allocation contract, e.g. by deallocating a block that is not
    /// live or by presenting a different size than the one it was allocated with.
    #[error("invalid argument (address {address:#x}, size {size}): {problem}")]
    InvalidArgument {
        /// Address presented by the caller, or zero if the request carried no address.
        address: usize,

        /// Size presented by the caller.
        size: usize,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// The pool was asked to reset while some of its allocations were still live.
    #[error("cannot reset the pool while {count} allocations are live")]
    LiveAllocations {
        /// Number of allocations that had not been deallocated.
        count: usize,
    },
}

impl Error {
    pub(crate) fn zero_sized() -> Self {
        Self::InvalidArgument {
            address: 0,
            size: 0,
            problem: "zero-sized allocations are not supported".to_string(),
        }
    }
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
