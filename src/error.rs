//! Error types for the table engine.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an
//! alias for `std::result::Result<T, Error>`.

use thiserror::Error;

/// Errors that can occur while building, reading, or transforming tables.
#[derive(Error, Debug)]
pub enum Error {
    /// A write was attempted against a buffer that has already been frozen.
    #[error("buffer is frozen")]
    Frozen,

    /// A categorical buffer cannot represent another distinct category at
    /// its configured index width.
    #[error("categorical buffer of width {width} cannot hold another distinct value (dictionary size would exceed {max})")]
    CategoryOverflow {
        /// The buffer's index width in bits.
        width: u8,
        /// The maximum number of non-null dictionary entries at that width.
        max: u64,
    },

    /// Converting an existing categorical column into a narrower index
    /// format was refused because it would lose information.
    #[error("cannot narrow categorical format from width {from} to width {to}")]
    FormatNarrowing {
        /// Width of the source column, in bits.
        from: u8,
        /// Width requested for the destination buffer, in bits.
        to: u8,
    },

    /// An element class or column type was unsuitable for the requested
    /// operation.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The type that was expected.
        expected: String,
        /// The type that was actually supplied.
        actual: String,
    },

    /// Boolean coercion failed because the dictionary has the wrong
    /// cardinality or the requested positive value is unknown.
    #[error("not a boolean column: {0}")]
    NotBoolean(String),

    /// A sort was requested on a column without an intrinsic order or a
    /// supplied comparator.
    #[error("column has no intrinsic order or comparator")]
    Unordered,

    /// The host became inactive before or during execution of a parallel
    /// task.
    #[error("task aborted: host is no longer active")]
    TaskAborted,

    /// A user-supplied calculator function raised an error.
    #[error("computation failed: {0}")]
    ComputationFailed(String),

    /// An object reducer's supplier returned no accumulator.
    #[error("reducer supplier returned a null accumulator")]
    NullAccumulator,

    /// The binary format's magic bytes did not match.
    #[error("invalid magic bytes")]
    InvalidMagic,

    /// The file's major or minor version is incompatible with this reader.
    #[error("incompatible format version: {major}.{minor}")]
    IncompatibleVersion {
        /// Major version read from the file.
        major: u8,
        /// Minor version read from the file.
        minor: u8,
    },

    /// The file ended before all expected bytes were read.
    #[error("truncated file: expected {expected} more bytes, found {found}")]
    Truncated {
        /// Bytes that were expected to follow.
        expected: usize,
        /// Bytes that were actually available.
        found: usize,
    },

    /// A value read from a file violates a structural invariant (negative
    /// width/height, an out-of-range categorical index, a conflicting
    /// temporal sentinel).
    #[error("domain violation: {0}")]
    DomainViolation(String),

    /// An indexed access used a negative or out-of-range argument.
    #[error("index {index} out of bounds (size {size})")]
    OutOfBounds {
        /// The offending index.
        index: i64,
        /// The size of the collection that was indexed.
        size: usize,
    },

    /// Table construction was given labels that are not unique, columns of
    /// unequal height, or another invalid shape.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// An I/O error occurred while reading or writing the binary format.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
