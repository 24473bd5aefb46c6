//! MPEG-1 video data types.

use std::fmt;

/// Start code prefix shared by every start code.
pub const START_CODE_PREFIX: u32 = 0x00_0001;
/// Picture start code.
pub const PICTURE_START_CODE: u32 = 0x0000_0100;
/// First slice start code (vertical position 1).
pub const SLICE_START_CODE_MIN: u32 = 0x0000_0101;
/// Last slice start code (vertical position 175).
pub const SLICE_START_CODE_MAX: u32 = 0x0000_01AF;
/// User data start code.
pub const USER_DATA_START_CODE: u32 = 0x0000_01B2;
/// Sequence header code.
pub const SEQUENCE_HEADER_CODE: u32 = 0x0000_01B3;
/// Sequence error code.
pub const SEQUENCE_ERROR_CODE: u32 = 0x0000_01B4;
/// Extension start code.
pub const EXTENSION_START_CODE: u32 = 0x0000_01B5;
/// Sequence end code.
pub const SEQUENCE_END_CODE: u32 = 0x0000_01B7;
/// Group of pictures start code.
pub const GROUP_START_CODE: u32 = 0x0000_01B8;

/// Check whether a 32-bit start code is a slice start code.
pub fn is_slice_start_code(code: u32) -> bool {
    (SLICE_START_CODE_MIN..=SLICE_START_CODE_MAX).contains(&code)
}

/// Zigzag scan order: scan position to natural (row-major) position.
pub const ZIGZAG_SCAN: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Inverse zigzag: natural position to scan position.
pub const INVERSE_ZIGZAG: [usize; 64] = [
    0, 1, 5, 6, 14, 15, 27, 28, 2, 4, 7, 13, 16, 26, 29, 42, 3, 8, 12, 17, 25, 30, 41, 43, 9, 11,
    18, 24, 31, 40, 44, 53, 10, 19, 23, 32, 39, 45, 52, 54, 20, 22, 33, 38, 46, 51, 55, 60, 21, 34,
    37, 47, 50, 56, 59, 61, 35, 36, 48, 49, 57, 58, 62, 63,
];

/// Default intra quantizer matrix in natural order.
pub const DEFAULT_INTRA_QUANTIZER_MATRIX: [u8; 64] = [
    8, 16, 19, 22, 26, 27, 29, 34, 16, 16, 22, 24, 27, 29, 34, 37, 19, 22, 26, 27, 29, 34, 34, 38,
    22, 22, 26, 27, 29, 34, 37, 40, 22, 26, 27, 29, 32, 35, 40, 48, 26, 27, 29, 32, 35, 40, 48, 58,
    26, 27, 29, 34, 38, 46, 56, 69, 27, 29, 35, 38, 46, 56, 69, 83,
];

/// Default non-intra quantizer matrix (flat).
pub const DEFAULT_NON_INTRA_QUANTIZER_MATRIX: [u8; 64] = [16; 64];

/// Picture coding type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PictureType {
    /// Intra-coded picture.
    Intra = 1,
    /// Forward-predicted picture.
    Predictive = 2,
    /// Bidirectionally predicted picture.
    Bidirectional = 3,
    /// DC-only intra picture.
    DcIntra = 4,
}

impl PictureType {
    /// Parse from the 3-bit picture_coding_type field.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(PictureType::Intra),
            2 => Some(PictureType::Predictive),
            3 => Some(PictureType::Bidirectional),
            4 => Some(PictureType::DcIntra),
            _ => None,
        }
    }

    /// The picture_coding_type field value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Check if pictures of this type serve as prediction references.
    pub fn is_reference(self) -> bool {
        matches!(self, PictureType::Intra | PictureType::Predictive)
    }
}

impl fmt::Display for PictureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PictureType::Intra => write!(f, "I"),
            PictureType::Predictive => write!(f, "P"),
            PictureType::Bidirectional => write!(f, "B"),
            PictureType::DcIntra => write!(f, "D"),
        }
    }
}

/// Prediction direction of a motion vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionDirection {
    /// Prediction from the past reference.
    Forward,
    /// Prediction from the future reference.
    Backward,
}

impl fmt::Display for MotionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionDirection::Forward => write!(f, "forward"),
            MotionDirection::Backward => write!(f, "backward"),
        }
    }
}

/// Sequence header parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceHeader {
    /// Horizontal size in pixels.
    pub width: u16,
    /// Vertical size in pixels.
    pub height: u16,
    /// pel_aspect_ratio code (1-14).
    pub aspect_ratio_code: u8,
    /// picture_rate code (1-8).
    pub picture_rate_code: u8,
    /// Bit rate in units of 400 bits/second, `0x3FFFF` for variable.
    pub bit_rate: u32,
    /// VBV buffer size in units of 16 kbit.
    pub vbv_buffer_size: u16,
    /// Constrained parameters flag.
    pub constrained_parameters: bool,
    /// Intra quantizer matrix in natural order.
    pub intra_quantizer_matrix: [u8; 64],
    /// Non-intra quantizer matrix in natural order.
    pub non_intra_quantizer_matrix: [u8; 64],
}

/// Bit rate value signalling a variable bit rate stream.
pub const VARIABLE_BIT_RATE: u32 = 0x3FFFF;

impl SequenceHeader {
    /// Create a sequence header with default matrices.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            aspect_ratio_code: 1,
            picture_rate_code: 5,
            bit_rate: VARIABLE_BIT_RATE,
            vbv_buffer_size: 0,
            constrained_parameters: false,
            intra_quantizer_matrix: DEFAULT_INTRA_QUANTIZER_MATRIX,
            non_intra_quantizer_matrix: DEFAULT_NON_INTRA_QUANTIZER_MATRIX,
        }
    }

    /// Width of the picture in macroblocks.
    pub fn mb_width(&self) -> usize {
        (usize::from(self.width) + 15) / 16
    }

    /// Height of the picture in macroblocks.
    pub fn mb_height(&self) -> usize {
        (usize::from(self.height) + 15) / 16
    }

    /// Pixel aspect ratio (height/width of a pel), if the code is defined.
    pub fn pixel_aspect_ratio(&self) -> Option<f64> {
        pixel_aspect_ratio(self.aspect_ratio_code)
    }

    /// Picture rate in pictures per second, if the code is defined.
    pub fn picture_rate(&self) -> Option<f64> {
        picture_rate(self.picture_rate_code)
    }

    /// Bit rate in bits per second, `None` for variable bit rate streams.
    pub fn bit_rate_bps(&self) -> Option<u64> {
        if self.bit_rate == VARIABLE_BIT_RATE {
            None
        } else {
            Some(u64::from(self.bit_rate) * 400)
        }
    }
}

/// Look up a pel_aspect_ratio code.
pub fn pixel_aspect_ratio(code: u8) -> Option<f64> {
    let ratio = match code {
        1 => 1.0,
        2 => 0.6735,
        3 => 0.7031,
        4 => 0.7615,
        5 => 0.8055,
        6 => 0.8437,
        7 => 0.8935,
        8 => 0.9157,
        9 => 0.9815,
        10 => 1.0255,
        11 => 1.0695,
        12 => 1.0950,
        13 => 1.1575,
        14 => 1.2015,
        _ => return None,
    };
    Some(ratio)
}

/// Look up a picture_rate code.
pub fn picture_rate(code: u8) -> Option<f64> {
    let rate = match code {
        1 => 24000.0 / 1001.0,
        2 => 24.0,
        3 => 25.0,
        4 => 30000.0 / 1001.0,
        5 => 30.0,
        6 => 50.0,
        7 => 60000.0 / 1001.0,
        8 => 60.0,
        _ => return None,
    };
    Some(rate)
}

/// SMPTE time code carried in a group of pictures header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeCode {
    /// Drop frame flag.
    pub drop_frame: bool,
    /// Hours (0-23).
    pub hours: u8,
    /// Minutes (0-59).
    pub minutes: u8,
    /// Seconds (0-59).
    pub seconds: u8,
    /// Pictures within the second.
    pub pictures: u8,
}

impl TimeCode {
    /// Unpack the 25-bit time_code field. The marker bit is ignored.
    pub fn from_bits(bits: u32) -> Self {
        Self {
            drop_frame: (bits >> 24) & 1 == 1,
            hours: ((bits >> 19) & 0x1F) as u8,
            minutes: ((bits >> 13) & 0x3F) as u8,
            seconds: ((bits >> 6) & 0x3F) as u8,
            pictures: (bits & 0x3F) as u8,
        }
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.drop_frame { ';' } else { ':' };
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours, self.minutes, self.seconds, sep, self.pictures
        )
    }
}

/// Group of pictures header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupOfPictures {
    /// Time code of the first picture.
    pub time_code: TimeCode,
    /// No picture in the group predicts from the previous group.
    pub closed_gop: bool,
    /// The leading B pictures cannot be decoded correctly.
    pub broken_link: bool,
}

/// Motion vector range parameters for one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionCode {
    /// Vectors are in full-pel rather than half-pel units.
    pub full_pel: bool,
    /// The 3-bit f_code (1-7).
    pub f_code: u8,
}

impl MotionCode {
    /// Bit length of the motion residual field.
    pub fn r_size(&self) -> u32 {
        u32::from(self.f_code.saturating_sub(1))
    }

    /// Motion vector scale.
    pub fn f(&self) -> i32 {
        1 << self.r_size()
    }
}

/// Picture header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureHeader {
    /// Temporal reference (display order modulo 1024).
    pub temporal_reference: u16,
    /// Coding type.
    pub picture_type: PictureType,
    /// VBV delay.
    pub vbv_delay: u16,
    /// Forward motion parameters (P and B pictures).
    pub forward: Option<MotionCode>,
    /// Backward motion parameters (B pictures).
    pub backward: Option<MotionCode>,
}
