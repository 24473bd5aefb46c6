//! MPEG-1 video decoder error types.

use thiserror::Error;

use crate::types::{MotionDirection, PictureType};

/// Table a failed variable-length code was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlcTable {
    /// Macroblock address increment.
    MacroblockAddressIncrement,
    /// Macroblock type for the current picture coding type.
    MacroblockType(PictureType),
    /// Motion vector code.
    MotionCode,
    /// Coded block pattern.
    CodedBlockPattern,
    /// Luma DC size.
    DcSizeLuma,
    /// Chroma DC size.
    DcSizeChroma,
    /// DCT coefficient run/level.
    DctCoefficient,
}

impl std::fmt::Display for VlcTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VlcTable::MacroblockAddressIncrement => write!(f, "macroblock_address_increment"),
            VlcTable::MacroblockType(t) => write!(f, "macroblock_type ({t} picture)"),
            VlcTable::MotionCode => write!(f, "motion_code"),
            VlcTable::CodedBlockPattern => write!(f, "coded_block_pattern"),
            VlcTable::DcSizeLuma => write!(f, "dct_dc_size_luminance"),
            VlcTable::DcSizeChroma => write!(f, "dct_dc_size_chrominance"),
            VlcTable::DctCoefficient => write!(f, "dct_coeff"),
        }
    }
}

/// MPEG-1 video decoder error.
#[derive(Debug, Error)]
pub enum Mpeg1Error {
    /// The byte source was exhausted in the middle of a syntax element.
    #[error("Unexpected end of MPEG-1 stream")]
    UnexpectedEndOfStream,

    /// The peeked bits match no entry of the table.
    #[error("Invalid {table} code (peeked bits {bits:#b})")]
    InvalidVlcCode {
        /// Table that was consulted.
        table: VlcTable,
        /// Bits that were peeked, right-aligned.
        bits: u32,
    },

    /// A predicted picture arrived before the reference it needs.
    #[error("Missing reference picture for {0} picture")]
    MissingReference(PictureType),

    /// An f_code of zero.
    #[error("Invalid {direction} f_code 0")]
    InvalidFCode {
        /// Prediction direction the f_code belongs to.
        direction: MotionDirection,
    },

    /// picture_coding_type outside I, P, B, D.
    #[error("Invalid picture coding type: {0}")]
    InvalidPictureType(u8),

    /// A start code that may not appear at this point of the syntax.
    #[error("Unexpected start code {0:#010x}")]
    UnexpectedStartCode(u32),

    /// Sequence dimensions that are zero or exceed the configured limits.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Horizontal size in pixels.
        width: u32,
        /// Vertical size in pixels.
        height: u32,
    },

    /// A macroblock address increment ran past the end of the picture.
    #[error("Macroblock address {address} outside picture of {count} macroblocks")]
    MacroblockAddressOutOfRange {
        /// Address that was reached.
        address: i64,
        /// Number of macroblocks in the picture.
        count: usize,
    },

    /// A motion vector pointing outside the reference picture.
    #[error("Motion vector ({x}, {y}) leaves the reference picture")]
    MotionVectorOutOfBounds {
        /// Horizontal sample position of the prediction.
        x: i64,
        /// Vertical sample position of the prediction.
        y: i64,
    },

    /// Run lengths of a block added up to more than 64 coefficients.
    #[error("DCT coefficient run overflows the block")]
    CoefficientOverrun,

    /// A skipped macroblock in a B picture directly after an intra macroblock.
    #[error("Skipped macroblock follows an intra macroblock in a B picture")]
    SkipAfterIntra,

    /// The consumer dropped the output queue.
    #[error("Output queue closed by consumer")]
    OutputClosed,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Mpeg1Error {
    /// Check if the error aborts decoding of the stream.
    ///
    /// A closed output queue only means nobody is listening any more.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Mpeg1Error::OutputClosed)
    }
}

impl From<mpeg1_core::Error> for Mpeg1Error {
    fn from(err: mpeg1_core::Error) -> Self {
        match err {
            mpeg1_core::Error::Io(e) => Mpeg1Error::Io(e),
            mpeg1_core::Error::Bitstream(mpeg1_core::BitstreamError::UnexpectedEnd) => {
                Mpeg1Error::UnexpectedEndOfStream
            }
            other => Mpeg1Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                other.to_string(),
            )),
        }
    }
}

/// MPEG-1 result type.
pub type Result<T> = std::result::Result<T, Mpeg1Error>;
