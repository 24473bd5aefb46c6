//! Error types for the bitstream layer.

use thiserror::Error;

/// Main error type for bitstream access.
#[derive(Error, Debug)]
pub enum Error {
    /// Bitstream parsing errors.
    #[error("Bitstream error: {0}")]
    Bitstream(#[from] BitstreamError),

    /// I/O errors raised by the byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bitstream parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitstreamError {
    /// The byte source ran dry before the requested bits were available.
    #[error("Unexpected end of bitstream")]
    UnexpectedEnd,

    /// A read or peek asked for more bits than a single access supports.
    #[error("Cannot access {requested} bits at once (maximum is 32)")]
    InvalidBitCount { requested: u32 },

    /// A write asked for a value that does not fit in the requested width.
    #[error("Value {value:#x} does not fit in {bits} bits")]
    ValueOverflow { value: u32, bits: u32 },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error means the byte source is exhausted.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Bitstream(BitstreamError::UnexpectedEnd))
    }
}
