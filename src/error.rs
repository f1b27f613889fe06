//! Crate-wide error type.

/// Errors returned by fallible container operations.
///
/// Lookups that find nothing return `None`; they are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The allocator is missing one of allocate/reallocate/release.
    IncompleteAllocator,

    /// An argument was rejected before anything was touched.
    InvalidArgument(&'static str),

    /// Indexed mutation past the end (or pop on an empty array).
    OutOfBounds { index: usize, len: usize },

    /// The allocator returned no block for a request of `size` bytes.
    AllocFailed { size: usize },

    /// A size computation overflowed `usize`.
    CapacityOverflow,

    /// A `Display` implementation reported an error while formatting.
    Format,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::IncompleteAllocator => f.write_str("allocator is missing a capability"),
            Error::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Error::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Error::AllocFailed { size } => write!(f, "allocation of {size} bytes failed"),
            Error::CapacityOverflow => f.write_str("capacity overflow"),
            Error::Format => f.write_str("formatting failed"),
        }
    }
}

impl std::error::Error for Error {}

/// Crate result
pub type Result<T> = core::result::Result<T, Error>;
