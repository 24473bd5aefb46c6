//! Synthetic stream construction shared by the integration tests and benches.

#![allow(dead_code)]

use mpeg1_core::BitWriter;
use mpeg1_video::idct::idct8x8;
use mpeg1_video::quant::dequantize_intra;
use mpeg1_video::{PictureType, ZIGZAG_SCAN};

/// A variable-length code as `(bits, length)`.
pub type Code = (u32, u32);

pub const INCREMENT_1: Code = (0b1, 1);
pub const INCREMENT_2: Code = (0b011, 3);
pub const INCREMENT_3: Code = (0b010, 3);

pub const I_INTRA: Code = (0b1, 1);
pub const I_INTRA_QUANT: Code = (0b01, 2);
pub const P_FORWARD: Code = (0b001, 3);
pub const P_PATTERN: Code = (0b01, 2);
pub const P_INTRA: Code = (0b0001_1, 5);
pub const B_FORWARD: Code = (0b0010, 4);
pub const B_BACKWARD: Code = (0b010, 3);
pub const B_INTERPOLATED: Code = (0b10, 2);
pub const D_INTRA: Code = (0b1, 1);

pub const MOTION_ZERO: Code = (0b1, 1);
pub const MOTION_PLUS_1: Code = (0b010, 3);
pub const MOTION_MINUS_1: Code = (0b011, 3);
pub const MOTION_MINUS_2: Code = (0b0011, 4);

/// coded_block_pattern 4: only block 3.
pub const CBP_BLOCK_3: Code = (0b1101, 4);

/// Run 0, level 1 as the first coefficient of a non-intra block (sign follows).
pub const COEFF_FIRST_1: Code = (0b1, 1);
/// Run 0, level 1 after the first coefficient (sign follows).
pub const COEFF_NEXT_1: Code = (0b11, 2);
/// Run 1, level 1 (sign follows).
pub const COEFF_RUN_1: Code = (0b011, 3);
pub const END_OF_BLOCK: Code = (0b10, 2);

const DC_SIZE_LUMA: [Code; 9] = [
    (0b100, 3),
    (0b00, 2),
    (0b01, 2),
    (0b101, 3),
    (0b110, 3),
    (0b1110, 4),
    (0b1111_0, 5),
    (0b1111_10, 6),
    (0b1111_110, 7),
];

const DC_SIZE_CHROMA: [Code; 9] = [
    (0b00, 2),
    (0b01, 2),
    (0b10, 2),
    (0b110, 3),
    (0b1110, 4),
    (0b1111_0, 5),
    (0b1111_10, 6),
    (0b1111_110, 7),
    (0b1111_1110, 8),
];

/// Writes an MPEG-1 elementary stream field by field.
#[derive(Default)]
pub struct StreamBuilder {
    writer: BitWriter,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits(mut self, value: u32, n: u32) -> Self {
        self.writer.write_bits(value, n).unwrap();
        self
    }

    pub fn code(self, code: Code) -> Self {
        self.bits(code.0, code.1)
    }

    pub fn start_code(mut self, id: u8) -> Self {
        self.writer.write_start_code(id);
        self
    }

    /// Sequence header with default matrices, aspect code 1, 25 Hz.
    pub fn sequence_header(self, width: u32, height: u32) -> Self {
        self.sequence_header_with_matrices(width, height, None, None)
    }

    /// Sequence header loading the given matrices (natural order).
    pub fn sequence_header_with_matrices(
        self,
        width: u32,
        height: u32,
        intra: Option<&[u8; 64]>,
        non_intra: Option<&[u8; 64]>,
    ) -> Self {
        self.start_code(0xB3)
            .bits(width, 12)
            .bits(height, 12)
            .bits(1, 4)
            .bits(3, 4)
            .bits(1000, 18)
            .bits(1, 1)
            .bits(20, 10)
            .bits(0, 1)
            .matrix(intra)
            .matrix(non_intra)
    }

    fn matrix(self, matrix: Option<&[u8; 64]>) -> Self {
        match matrix {
            None => self.bits(0, 1),
            Some(matrix) => ZIGZAG_SCAN
                .iter()
                .fold(self.bits(1, 1), |b, &i| b.bits(u32::from(matrix[i]), 8)),
        }
    }

    pub fn group(self, closed: bool) -> Self {
        // Time code 00:00:00:00 with its marker bit.
        self.start_code(0xB8)
            .bits(1 << 12, 25)
            .bits(u32::from(closed), 1)
            .bits(0, 1)
    }

    /// Picture header; `f_code` is used for every motion direction the type has.
    pub fn picture(self, temporal_reference: u32, picture_type: PictureType, f_code: u32) -> Self {
        let mut builder = self
            .start_code(0x00)
            .bits(temporal_reference, 10)
            .bits(u32::from(picture_type.code()), 3)
            .bits(0xFFFF, 16);
        if matches!(
            picture_type,
            PictureType::Predictive | PictureType::Bidirectional
        ) {
            builder = builder.bits(0, 1).bits(f_code, 3);
        }
        if picture_type == PictureType::Bidirectional {
            builder = builder.bits(0, 1).bits(f_code, 3);
        }
        builder.bits(0, 1)
    }

    pub fn slice(self, vertical_position: u8, quantizer_scale: u32) -> Self {
        self.start_code(vertical_position)
            .bits(quantizer_scale, 5)
            .bits(0, 1)
    }

    pub fn dc_luma(self, differential: i32) -> Self {
        let size = dc_size(differential);
        self.code(DC_SIZE_LUMA[size as usize])
            .bits(dc_bits(differential, size), size)
    }

    pub fn dc_chroma(self, differential: i32) -> Self {
        let size = dc_size(differential);
        self.code(DC_SIZE_CHROMA[size as usize])
            .bits(dc_bits(differential, size), size)
    }

    /// A table coded coefficient followed by its sign bit.
    pub fn coefficient(self, code: Code, negative: bool) -> Self {
        self.code(code).bits(u32::from(negative), 1)
    }

    /// An escaped run/level pair; levels outside -127..=127 take the
    /// 16-bit form.
    pub fn escape(self, run: u32, level: i32) -> Self {
        let builder = self.bits(0b0000_01, 6).bits(run, 6);
        match level {
            -127..=127 => builder.bits(level as u32 & 0xFF, 8),
            128..=255 => builder.bits(0x00, 8).bits(level as u32, 8),
            _ => builder.bits(0x80, 8).bits((level + 256) as u32, 8),
        }
    }

    /// Blocks 1-5 of an intra macroblock, all with a zero DC differential.
    pub fn flat_blocks_after_first(self) -> Self {
        self.dc_luma(0)
            .code(END_OF_BLOCK)
            .dc_luma(0)
            .code(END_OF_BLOCK)
            .dc_luma(0)
            .code(END_OF_BLOCK)
            .dc_chroma(0)
            .code(END_OF_BLOCK)
            .dc_chroma(0)
            .code(END_OF_BLOCK)
    }

    /// Six DC-only intra blocks. D pictures carry no end_of_block codes.
    pub fn intra_blocks(self, luma: [i32; 4], cb: i32, cr: i32, end_of_block: bool) -> Self {
        let mut builder = self;
        for differential in luma {
            builder = builder.dc_luma(differential);
            if end_of_block {
                builder = builder.code(END_OF_BLOCK);
            }
        }
        builder = builder.dc_chroma(cb);
        if end_of_block {
            builder = builder.code(END_OF_BLOCK);
        }
        builder = builder.dc_chroma(cr);
        if end_of_block {
            builder = builder.code(END_OF_BLOCK);
        }
        builder
    }

    /// A macroblock of an I picture with DC-only blocks.
    pub fn intra_macroblock(self, increment: Code, luma: [i32; 4], cb: i32, cr: i32) -> Self {
        self.code(increment)
            .code(I_INTRA)
            .intra_blocks(luma, cb, cr, true)
    }

    /// Terminate with a sequence end code.
    pub fn end(self) -> Vec<u8> {
        self.start_code(0xB7).finish()
    }

    /// Byte-align and return the stream as is.
    pub fn finish(mut self) -> Vec<u8> {
        self.writer.align_to_byte();
        self.writer.into_data()
    }
}

fn dc_size(differential: i32) -> u32 {
    32 - differential.unsigned_abs().leading_zeros()
}

fn dc_bits(differential: i32, size: u32) -> u32 {
    if differential >= 0 {
        differential as u32
    } else {
        (differential + (1 << size) - 1) as u32
    }
}

/// Sample value of a block whose only coefficient is the DC term `dc`.
pub fn dc_sample(dc: i32) -> u8 {
    let mut block = [0i32; 64];
    block[0] = dc;
    idct8x8(&mut block);
    block[0].clamp(0, 255) as u8
}

/// Samples of an intra block with DC `dc` and AC `levels` given as
/// `(transmission position, level)`.
pub fn intra_samples(dc: i32, levels: &[(usize, i32)], quantizer_scale: i32, matrix: &[u8; 64]) -> Vec<u8> {
    let mut coefficients = [0i32; 64];
    for &(position, level) in levels {
        coefficients[position] = level;
    }
    let mut block = [0i32; 64];
    dequantize_intra(&coefficients, quantizer_scale, matrix, dc, &mut block);
    idct8x8(&mut block);
    block.iter().map(|&s| s.clamp(0, 255) as u8).collect()
}

/// Half-sample average, rounding up.
pub fn average(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b) + 1) >> 1) as u8
}

/// An I picture of `mb_width` x 1 macroblocks whose luma DC steps up by
/// `step` differentials per macroblock.
pub fn intra_row(builder: StreamBuilder, mb_width: usize, step: i32) -> StreamBuilder {
    let mut builder = builder.slice(1, 1);
    for _ in 0..mb_width {
        builder = builder.intra_macroblock(INCREMENT_1, [step, 0, 0, 0], 0, 0);
    }
    builder
}
