//! Library error types.
//!
use std::fmt;

/// A tidepack Result, normally returning a tidepack [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A tidepack error. Encompasses any issue that can happen while encoding,
/// decoding, mutating a container, or converting to/from the JSON form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The output buffer was too small for the encoding, or the input buffer
    /// ran out mid-parse.
    BufferTooSmall {
        /// Bytes the operation needed from this point on
        needed: usize,
        /// Bytes actually available
        available: usize,
    },
    /// Input bytes or JSON that don't describe a valid value: a non-canonical
    /// varint, invalid UTF-8, an unknown discriminator, a missing structure
    /// field, and the like.
    Malformed(String),
    /// A container length fell outside its declared bounds.
    BadLength {
        /// The length that was requested or found
        len: usize,
        /// Minimum allowed length
        min: usize,
        /// Maximum allowed length
        max: usize,
    },
    /// A JSON value of the wrong kind was supplied where a specific kind was
    /// required.
    TypeMismatch {
        /// What the conversion expected to find
        expected: &'static str,
    },
    /// An integer doesn't fit the declared byte width.
    OutOfRange {
        /// The offending value, widened for display
        value: i128,
        /// The declared width in bytes
        width: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::BufferTooSmall { needed, available } => write!(
                f,
                "Buffer too small: needed {} bytes, had {}",
                needed, available
            ),
            Error::Malformed(ref err) => write!(f, "Malformed input: {}", err),
            Error::BadLength { len, min, max } => write!(
                f,
                "Length {} outside the allowed range [{}, {}]",
                len, min, max
            ),
            Error::TypeMismatch { expected } => {
                write!(f, "Wrong JSON value kind: expected {}", expected)
            }
            Error::OutOfRange { value, width } => {
                write!(f, "Value {} doesn't fit in {} byte(s)", value, width)
            }
        }
    }
}

impl std::error::Error for Error {}
