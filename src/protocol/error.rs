//! Error types shared by the codec, buffers and queues

use thiserror::Error;

/// Errors returned by every fallible operation in the crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Out-of-range field value or malformed call
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument {
        /// Field or parameter that was rejected
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Allocation failed
    #[error("out of memory: could not allocate {requested} bytes")]
    OutOfMemory {
        /// Number of bytes requested
        requested: usize,
    },

    /// Operation would exceed a length or admission limit
    #[error("{what} out of range: need {needed}, limit {limit}")]
    OutOfRange {
        /// Which limit was hit
        what: &'static str,
        /// Value the operation needed
        needed: u64,
        /// Limit in force
        limit: u64,
    },

    /// Operation on an empty buffer, queue or slot
    #[error("{what} is empty")]
    Empty {
        /// What was empty
        what: &'static str,
    },

    /// Lookup failed
    #[error("{what} not found")]
    NotFound {
        /// What was looked up
        what: &'static str,
    },

    /// A record declares more bytes than remain in the region
    #[error("malformed record at offset {offset}: declares {declared} bytes, {available} available")]
    MalformedRecord {
        /// Offset of the record within the record region
        offset: usize,
        /// Bytes the record claims (overhead included)
        declared: usize,
        /// Bytes left in the region at that offset
        available: usize,
    },

    /// Input too short to hold a header
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Needed size
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// Header length disagrees with the bytes supplied
    #[error("length mismatch: header declares {declared} bytes, got {actual}")]
    LengthMismatch {
        /// `header.len`
        declared: usize,
        /// Bytes actually supplied
        actual: usize,
    },

    /// Stored checksum does not match the message contents
    #[error("checksum mismatch: expected {expected:#06x}, got {found:#06x}")]
    ChecksumMismatch {
        /// Checksum computed over the message
        expected: u16,
        /// Checksum stored in the header
        found: u16,
    },
}

impl Error {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) const fn out_of_range(what: &'static str, needed: u64, limit: u64) -> Self {
        Self::OutOfRange {
            what,
            needed,
            limit,
        }
    }

    pub(crate) const fn empty(what: &'static str) -> Self {
        Self::Empty { what }
    }

    pub(crate) const fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
