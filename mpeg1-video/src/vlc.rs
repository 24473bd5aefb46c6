//! Variable-length code tables and decoders.
//!
//! Every table is expanded at compile time from the code list of
//! ISO/IEC 11172-2 Annex B. A decoder peeks the longest code length of its
//! category, indexes the expanded table with the peeked bits (shorter codes
//! fill several consecutive slots) and consumes exactly the matched length.
//! An entry with length 0 marks a bit pattern that is not a valid code.

use std::io::Read;

use bitflags::bitflags;
use mpeg1_core::bitstream::sign_extend;
use mpeg1_core::BitReader;

use crate::error::{Mpeg1Error, Result, VlcTable};
use crate::types::PictureType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VlcEntry {
    value: i16,
    length: u8,
}

const EMPTY: VlcEntry = VlcEntry {
    value: 0,
    length: 0,
};

/// `(code, length, value)` with the code right-aligned.
type CodeList = [(u32, u8, i16)];

const fn build_table<const N: usize>(codes: &CodeList, bits: u8) -> [VlcEntry; N] {
    let mut table = [EMPTY; N];
    let mut i = 0;
    while i < codes.len() {
        let (code, length, value) = codes[i];
        let shift = bits - length;
        let mut index = (code << shift) as usize;
        let end = ((code + 1) << shift) as usize;
        while index < end {
            table[index] = VlcEntry { value, length };
            index += 1;
        }
        i += 1;
    }
    table
}

fn lookup<R: Read>(
    reader: &mut BitReader<R>,
    table: &[VlcEntry],
    bits: u32,
    which: VlcTable,
) -> Result<i16> {
    let peeked = reader.peek_bits(bits)?;
    let entry = table[peeked as usize];
    if entry.length == 0 {
        return Err(Mpeg1Error::InvalidVlcCode {
            table: which,
            bits: peeked,
        });
    }
    reader.skip_bits(u64::from(entry.length))?;
    Ok(entry.value)
}

// =============================================================================
// Macroblock address increment
// =============================================================================

const MBA_BITS: u32 = 11;
const MBA_STUFFING: u32 = 0b0000_0001_111;
const MBA_ESCAPE: u32 = 0b0000_0001_000;

const MBA_CODES: &CodeList = &[
    (0b1, 1, 1),
    (0b011, 3, 2),
    (0b010, 3, 3),
    (0b0011, 4, 4),
    (0b0010, 4, 5),
    (0b0001_1, 5, 6),
    (0b0001_0, 5, 7),
    (0b0000_111, 7, 8),
    (0b0000_110, 7, 9),
    (0b0000_1011, 8, 10),
    (0b0000_1010, 8, 11),
    (0b0000_1001, 8, 12),
    (0b0000_1000, 8, 13),
    (0b0000_0111, 8, 14),
    (0b0000_0110, 8, 15),
    (0b0000_0101_11, 10, 16),
    (0b0000_0101_10, 10, 17),
    (0b0000_0101_01, 10, 18),
    (0b0000_0101_00, 10, 19),
    (0b0000_0100_11, 10, 20),
    (0b0000_0100_10, 10, 21),
    (0b0000_0100_011, 11, 22),
    (0b0000_0100_010, 11, 23),
    (0b0000_0100_001, 11, 24),
    (0b0000_0100_000, 11, 25),
    (0b0000_0011_111, 11, 26),
    (0b0000_0011_110, 11, 27),
    (0b0000_0011_101, 11, 28),
    (0b0000_0011_100, 11, 29),
    (0b0000_0011_011, 11, 30),
    (0b0000_0011_010, 11, 31),
    (0b0000_0011_001, 11, 32),
    (0b0000_0011_000, 11, 33),
];

static MBA_TABLE: [VlcEntry; 1 << MBA_BITS] = build_table(MBA_CODES, MBA_BITS as u8);

/// Read a macroblock address increment.
///
/// Stuffing codes are discarded and every escape code adds 33 to the
/// increment that follows.
pub fn read_macroblock_address_increment<R: Read>(reader: &mut BitReader<R>) -> Result<u32> {
    let mut increment = 0u32;
    loop {
        match reader.peek_bits(MBA_BITS)? {
            MBA_STUFFING => reader.skip_bits(u64::from(MBA_BITS))?,
            MBA_ESCAPE => {
                reader.skip_bits(u64::from(MBA_BITS))?;
                increment += 33;
            }
            _ => break,
        }
    }
    let value = lookup(
        reader,
        &MBA_TABLE,
        MBA_BITS,
        VlcTable::MacroblockAddressIncrement,
    )?;
    Ok(increment + value as u32)
}

// =============================================================================
// Macroblock type
// =============================================================================

bitflags! {
    /// Decoded macroblock_type flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MacroblockType: u8 {
        /// The macroblock is intra coded.
        const INTRA = 0x01;
        /// A coded_block_pattern follows.
        const PATTERN = 0x02;
        /// A backward motion vector follows.
        const MOTION_BACKWARD = 0x04;
        /// A forward motion vector follows.
        const MOTION_FORWARD = 0x08;
        /// A new quantizer_scale follows.
        const QUANT = 0x10;
    }
}

impl MacroblockType {
    /// Check if the macroblock is intra coded.
    pub fn is_intra(self) -> bool {
        self.contains(Self::INTRA)
    }

    /// Check if the macroblock carries a forward vector.
    pub fn has_forward(self) -> bool {
        self.contains(Self::MOTION_FORWARD)
    }

    /// Check if the macroblock carries a backward vector.
    pub fn has_backward(self) -> bool {
        self.contains(Self::MOTION_BACKWARD)
    }

    /// Check if a coded block pattern follows.
    pub fn has_pattern(self) -> bool {
        self.contains(Self::PATTERN)
    }

    /// Check if a quantizer scale follows.
    pub fn has_quant(self) -> bool {
        self.contains(Self::QUANT)
    }
}

const MB_TYPE_I_CODES: &CodeList = &[(0b1, 1, 0x01), (0b01, 2, 0x11)];

const MB_TYPE_P_CODES: &CodeList = &[
    (0b1, 1, 0x0A),
    (0b01, 2, 0x02),
    (0b001, 3, 0x08),
    (0b0001_1, 5, 0x01),
    (0b0001_0, 5, 0x1A),
    (0b0000_1, 5, 0x12),
    (0b0000_01, 6, 0x11),
];

const MB_TYPE_B_CODES: &CodeList = &[
    (0b10, 2, 0x0C),
    (0b11, 2, 0x0E),
    (0b010, 3, 0x04),
    (0b011, 3, 0x06),
    (0b0010, 4, 0x08),
    (0b0011, 4, 0x0A),
    (0b0001_1, 5, 0x01),
    (0b0001_0, 5, 0x1E),
    (0b0000_11, 6, 0x1A),
    (0b0000_10, 6, 0x16),
    (0b0000_01, 6, 0x11),
];

const MB_TYPE_D_CODES: &CodeList = &[(0b1, 1, 0x01)];

static MB_TYPE_I_TABLE: [VlcEntry; 4] = build_table(MB_TYPE_I_CODES, 2);
static MB_TYPE_P_TABLE: [VlcEntry; 64] = build_table(MB_TYPE_P_CODES, 6);
static MB_TYPE_B_TABLE: [VlcEntry; 64] = build_table(MB_TYPE_B_CODES, 6);
static MB_TYPE_D_TABLE: [VlcEntry; 2] = build_table(MB_TYPE_D_CODES, 1);

/// Read a macroblock_type for a picture of the given coding type.
pub fn read_macroblock_type<R: Read>(
    reader: &mut BitReader<R>,
    picture_type: PictureType,
) -> Result<MacroblockType> {
    let (table, bits): (&[VlcEntry], u32) = match picture_type {
        PictureType::Intra => (&MB_TYPE_I_TABLE, 2),
        PictureType::Predictive => (&MB_TYPE_P_TABLE, 6),
        PictureType::Bidirectional => (&MB_TYPE_B_TABLE, 6),
        PictureType::DcIntra => (&MB_TYPE_D_TABLE, 1),
    };
    let value = lookup(reader, table, bits, VlcTable::MacroblockType(picture_type))?;
    Ok(MacroblockType::from_bits_retain(value as u8))
}

// =============================================================================
// Motion vector code
// =============================================================================

const MOTION_BITS: u32 = 11;

const MOTION_CODES: &CodeList = &[
    (0b1, 1, 0),
    (0b010, 3, 1),
    (0b011, 3, -1),
    (0b0010, 4, 2),
    (0b0011, 4, -2),
    (0b0001_0, 5, 3),
    (0b0001_1, 5, -3),
    (0b0000_110, 7, 4),
    (0b0000_111, 7, -4),
    (0b0000_1010, 8, 5),
    (0b0000_1011, 8, -5),
    (0b0000_1000, 8, 6),
    (0b0000_1001, 8, -6),
    (0b0000_0110, 8, 7),
    (0b0000_0111, 8, -7),
    (0b0000_0101_10, 10, 8),
    (0b0000_0101_11, 10, -8),
    (0b0000_0101_00, 10, 9),
    (0b0000_0101_01, 10, -9),
    (0b0000_0100_10, 10, 10),
    (0b0000_0100_11, 10, -10),
    (0b0000_0100_010, 11, 11),
    (0b0000_0100_011, 11, -11),
    (0b0000_0100_000, 11, 12),
    (0b0000_0100_001, 11, -12),
    (0b0000_0011_110, 11, 13),
    (0b0000_0011_111, 11, -13),
    (0b0000_0011_100, 11, 14),
    (0b0000_0011_101, 11, -14),
    (0b0000_0011_010, 11, 15),
    (0b0000_0011_011, 11, -15),
    (0b0000_0011_000, 11, 16),
    (0b0000_0011_001, 11, -16),
];

static MOTION_TABLE: [VlcEntry; 1 << MOTION_BITS] = build_table(MOTION_CODES, MOTION_BITS as u8);

/// Read a motion_horizontal/vertical code in -16..=16.
pub fn read_motion_code<R: Read>(reader: &mut BitReader<R>) -> Result<i32> {
    lookup(reader, &MOTION_TABLE, MOTION_BITS, VlcTable::MotionCode).map(i32::from)
}

// =============================================================================
// Coded block pattern
// =============================================================================

const CBP_BITS: u32 = 9;

const CBP_CODES: &CodeList = &[
    (0b111, 3, 60),
    (0b1101, 4, 4),
    (0b1100, 4, 8),
    (0b1011, 4, 16),
    (0b1010, 4, 32),
    (0b1001_1, 5, 12),
    (0b1001_0, 5, 48),
    (0b1000_1, 5, 20),
    (0b1000_0, 5, 40),
    (0b0111_1, 5, 28),
    (0b0111_0, 5, 44),
    (0b0110_1, 5, 52),
    (0b0110_0, 5, 56),
    (0b0101_1, 5, 1),
    (0b0101_0, 5, 61),
    (0b0100_1, 5, 2),
    (0b0100_0, 5, 62),
    (0b0011_11, 6, 24),
    (0b0011_10, 6, 36),
    (0b0011_01, 6, 3),
    (0b0011_00, 6, 63),
    (0b0010_111, 7, 5),
    (0b0010_110, 7, 9),
    (0b0010_101, 7, 17),
    (0b0010_100, 7, 33),
    (0b0010_011, 7, 6),
    (0b0010_010, 7, 10),
    (0b0010_001, 7, 18),
    (0b0010_000, 7, 34),
    (0b0001_1111, 8, 7),
    (0b0001_1110, 8, 11),
    (0b0001_1101, 8, 19),
    (0b0001_1100, 8, 35),
    (0b0001_1011, 8, 13),
    (0b0001_1010, 8, 49),
    (0b0001_1001, 8, 21),
    (0b0001_1000, 8, 41),
    (0b0001_0111, 8, 14),
    (0b0001_0110, 8, 50),
    (0b0001_0101, 8, 22),
    (0b0001_0100, 8, 42),
    (0b0001_0011, 8, 15),
    (0b0001_0010, 8, 51),
    (0b0001_0001, 8, 23),
    (0b0001_0000, 8, 43),
    (0b0000_1111, 8, 25),
    (0b0000_1110, 8, 37),
    (0b0000_1101, 8, 26),
    (0b0000_1100, 8, 38),
    (0b0000_1011, 8, 29),
    (0b0000_1010, 8, 45),
    (0b0000_1001, 8, 53),
    (0b0000_1000, 8, 57),
    (0b0000_0111, 8, 30),
    (0b0000_0110, 8, 46),
    (0b0000_0101, 8, 54),
    (0b0000_0100, 8, 58),
    (0b0000_0011_1, 9, 31),
    (0b0000_0011_0, 9, 47),
    (0b0000_0010_1, 9, 55),
    (0b0000_0010_0, 9, 59),
    (0b0000_0001_1, 9, 27),
    (0b0000_0001_0, 9, 39),
];

static CBP_TABLE: [VlcEntry; 1 << CBP_BITS] = build_table(CBP_CODES, CBP_BITS as u8);

/// Read a coded_block_pattern. Bit `5 - i` flags block `i`.
pub fn read_coded_block_pattern<R: Read>(reader: &mut BitReader<R>) -> Result<u8> {
    lookup(reader, &CBP_TABLE, CBP_BITS, VlcTable::CodedBlockPattern).map(|v| v as u8)
}

// =============================================================================
// DC size
// =============================================================================

const DC_SIZE_LUMA_CODES: &CodeList = &[
    (0b100, 3, 0),
    (0b00, 2, 1),
    (0b01, 2, 2),
    (0b101, 3, 3),
    (0b110, 3, 4),
    (0b1110, 4, 5),
    (0b1111_0, 5, 6),
    (0b1111_10, 6, 7),
    (0b1111_110, 7, 8),
];

const DC_SIZE_CHROMA_CODES: &CodeList = &[
    (0b00, 2, 0),
    (0b01, 2, 1),
    (0b10, 2, 2),
    (0b110, 3, 3),
    (0b1110, 4, 4),
    (0b1111_0, 5, 5),
    (0b1111_10, 6, 6),
    (0b1111_110, 7, 7),
    (0b1111_1110, 8, 8),
];

static DC_SIZE_LUMA_TABLE: [VlcEntry; 128] = build_table(DC_SIZE_LUMA_CODES, 7);
static DC_SIZE_CHROMA_TABLE: [VlcEntry; 256] = build_table(DC_SIZE_CHROMA_CODES, 8);

/// Read dct_dc_size_luminance.
pub fn read_dc_size_luma<R: Read>(reader: &mut BitReader<R>) -> Result<u32> {
    lookup(reader, &DC_SIZE_LUMA_TABLE, 7, VlcTable::DcSizeLuma).map(|v| v as u32)
}

/// Read dct_dc_size_chrominance.
pub fn read_dc_size_chroma<R: Read>(reader: &mut BitReader<R>) -> Result<u32> {
    lookup(reader, &DC_SIZE_CHROMA_TABLE, 8, VlcTable::DcSizeChroma).map(|v| v as u32)
}

/// Read a DC differential of `size` bits.
///
/// A leading zero bit marks a negative value in the offset form
/// `(-1 << size) | (raw + 1)`.
pub fn read_dc_differential<R: Read>(reader: &mut BitReader<R>, size: u32) -> Result<i32> {
    if size == 0 {
        return Ok(0);
    }
    let raw = reader.read_bits(size)? as i32;
    if raw & (1 << (size - 1)) != 0 {
        Ok(raw)
    } else {
        Ok((-1 << size) | (raw + 1))
    }
}

// =============================================================================
// DCT coefficients
// =============================================================================

/// A decoded run of zero coefficients followed by a nonzero level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLevel {
    /// Number of zero coefficients skipped.
    pub run: u32,
    /// Signed coefficient value.
    pub level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CoeffEntry {
    run: u8,
    level: u8,
    length: u8,
}

const EMPTY_COEFF: CoeffEntry = CoeffEntry {
    run: 0,
    level: 0,
    length: 0,
};

/// `(run, level, code, length)`; length excludes the sign bit.
type CoeffCodeList = [(u8, u8, u32, u8)];

/// Expand a coefficient code list. `prefix` leading zero bits are implied
/// by the table the entries land in and are not part of the listed code.
const fn build_coeff_table<const N: usize>(
    lists: &[&CoeffCodeList],
    bits: u8,
    prefix: u8,
) -> [CoeffEntry; N] {
    let mut table = [EMPTY_COEFF; N];
    let mut l = 0;
    while l < lists.len() {
        let codes = lists[l];
        let mut i = 0;
        while i < codes.len() {
            let (run, level, code, length) = codes[i];
            let shift = bits - (length - prefix);
            let mut index = (code << shift) as usize;
            let end = ((code + 1) << shift) as usize;
            while index < end {
                table[index] = CoeffEntry { run, level, length };
                index += 1;
            }
            i += 1;
        }
        l += 1;
    }
    table
}

const DCT_ESCAPE: u32 = 0b0000_01;
const DCT_END_OF_BLOCK: u32 = 0b10;
const DCT_SHORT_BITS: u8 = 12;
const DCT_LONG_PREFIX: u8 = 8;

const DCT_FIRST_CODES: &CoeffCodeList = &[(0, 1, 0b1, 1)];
const DCT_NEXT_CODES: &CoeffCodeList = &[(0, 1, 0b11, 2)];

const DCT_SHARED_CODES: &CoeffCodeList = &[
    (1, 1, 0b011, 3),
    (0, 2, 0b0100, 4),
    (2, 1, 0b0101, 4),
    (0, 3, 0b0010_1, 5),
    (3, 1, 0b0011_1, 5),
    (4, 1, 0b0011_0, 5),
    (1, 2, 0b0001_10, 6),
    (5, 1, 0b0001_11, 6),
    (6, 1, 0b0001_01, 6),
    (7, 1, 0b0001_00, 6),
    (0, 4, 0b0000_110, 7),
    (2, 2, 0b0000_100, 7),
    (8, 1, 0b0000_111, 7),
    (9, 1, 0b0000_101, 7),
    (0, 5, 0b0010_0110, 8),
    (0, 6, 0b0010_0001, 8),
    (1, 3, 0b0010_0101, 8),
    (3, 2, 0b0010_0100, 8),
    (10, 1, 0b0010_0111, 8),
    (11, 1, 0b0010_0011, 8),
    (12, 1, 0b0010_0010, 8),
    (13, 1, 0b0010_0000, 8),
    (0, 7, 0b0000_0010_10, 10),
    (1, 4, 0b0000_0011_00, 10),
    (2, 3, 0b0000_0010_11, 10),
    (4, 2, 0b0000_0011_11, 10),
    (5, 2, 0b0000_0010_01, 10),
    (14, 1, 0b0000_0011_10, 10),
    (15, 1, 0b0000_0011_01, 10),
    (16, 1, 0b0000_0010_00, 10),
    (0, 8, 0b0000_0001_1101, 12),
    (0, 9, 0b0000_0001_1000, 12),
    (0, 10, 0b0000_0001_0011, 12),
    (0, 11, 0b0000_0001_0000, 12),
    (1, 5, 0b0000_0001_1011, 12),
    (2, 4, 0b0000_0001_0100, 12),
    (3, 3, 0b0000_0001_1100, 12),
    (4, 3, 0b0000_0001_0010, 12),
    (6, 2, 0b0000_0001_1110, 12),
    (7, 2, 0b0000_0001_0101, 12),
    (8, 2, 0b0000_0001_0001, 12),
    (17, 1, 0b0000_0001_1111, 12),
    (18, 1, 0b0000_0001_1010, 12),
    (19, 1, 0b0000_0001_1001, 12),
    (20, 1, 0b0000_0001_0111, 12),
    (21, 1, 0b0000_0001_0110, 12),
];

/// Codes starting with eight zero bits, listed without that prefix.
const DCT_LONG_CODES: &CoeffCodeList = &[
    (0, 12, 0b1101_0, 13),
    (0, 13, 0b1100_1, 13),
    (0, 14, 0b1100_0, 13),
    (0, 15, 0b1011_1, 13),
    (1, 6, 0b1011_0, 13),
    (1, 7, 0b1010_1, 13),
    (2, 5, 0b1010_0, 13),
    (3, 4, 0b1001_1, 13),
    (5, 3, 0b1001_0, 13),
    (9, 2, 0b1000_1, 13),
    (10, 2, 0b1000_0, 13),
    (22, 1, 0b1111_1, 13),
    (23, 1, 0b1111_0, 13),
    (24, 1, 0b1110_1, 13),
    (25, 1, 0b1110_0, 13),
    (26, 1, 0b1101_1, 13),
    (0, 16, 0b0111_11, 14),
    (0, 17, 0b0111_10, 14),
    (0, 18, 0b0111_01, 14),
    (0, 19, 0b0111_00, 14),
    (0, 20, 0b0110_11, 14),
    (0, 21, 0b0110_10, 14),
    (0, 22, 0b0110_01, 14),
    (0, 23, 0b0110_00, 14),
    (0, 24, 0b0101_11, 14),
    (0, 25, 0b0101_10, 14),
    (0, 26, 0b0101_01, 14),
    (0, 27, 0b0101_00, 14),
    (0, 28, 0b0100_11, 14),
    (0, 29, 0b0100_10, 14),
    (0, 30, 0b0100_01, 14),
    (0, 31, 0b0100_00, 14),
    (0, 32, 0b0011_000, 15),
    (0, 33, 0b0010_111, 15),
    (0, 34, 0b0010_110, 15),
    (0, 35, 0b0010_101, 15),
    (0, 36, 0b0010_100, 15),
    (0, 37, 0b0010_011, 15),
    (0, 38, 0b0010_010, 15),
    (0, 39, 0b0010_001, 15),
    (0, 40, 0b0010_000, 15),
    (1, 8, 0b0011_111, 15),
    (1, 9, 0b0011_110, 15),
    (1, 10, 0b0011_101, 15),
    (1, 11, 0b0011_100, 15),
    (1, 12, 0b0011_011, 15),
    (1, 13, 0b0011_010, 15),
    (1, 14, 0b0011_001, 15),
    (1, 15, 0b0001_0011, 16),
    (1, 16, 0b0001_0010, 16),
    (1, 17, 0b0001_0001, 16),
    (1, 18, 0b0001_0000, 16),
    (6, 3, 0b0001_0100, 16),
    (11, 2, 0b0001_1010, 16),
    (12, 2, 0b0001_1001, 16),
    (13, 2, 0b0001_1000, 16),
    (14, 2, 0b0001_0111, 16),
    (15, 2, 0b0001_0110, 16),
    (16, 2, 0b0001_0101, 16),
    (27, 1, 0b0001_1111, 16),
    (28, 1, 0b0001_1110, 16),
    (29, 1, 0b0001_1101, 16),
    (30, 1, 0b0001_1100, 16),
    (31, 1, 0b0001_1011, 16),
];

static DCT_FIRST_TABLE: [CoeffEntry; 1 << DCT_SHORT_BITS] =
    build_coeff_table(&[DCT_FIRST_CODES, DCT_SHARED_CODES], DCT_SHORT_BITS, 0);
static DCT_NEXT_TABLE: [CoeffEntry; 1 << DCT_SHORT_BITS] =
    build_coeff_table(&[DCT_NEXT_CODES, DCT_SHARED_CODES], DCT_SHORT_BITS, 0);
static DCT_LONG_TABLE: [CoeffEntry; 1 << DCT_LONG_PREFIX] =
    build_coeff_table(&[DCT_LONG_CODES], DCT_LONG_PREFIX, DCT_LONG_PREFIX);

/// Check whether the next bits are the end_of_block code.
pub fn is_end_of_block<R: Read>(reader: &mut BitReader<R>) -> Result<bool> {
    Ok(reader.peek_bits(2)? == DCT_END_OF_BLOCK)
}

/// Consume the end_of_block code.
pub fn skip_end_of_block<R: Read>(reader: &mut BitReader<R>) -> Result<()> {
    reader.skip_bits(2)?;
    Ok(())
}

/// Read one run/level pair.
///
/// `first` selects the dct_coeff_first table of non-intra blocks, where the
/// short code `1s` stands for run 0, level 1 instead of starting end_of_block.
pub fn read_dct_coefficient<R: Read>(reader: &mut BitReader<R>, first: bool) -> Result<RunLevel> {
    let bits = reader.peek_bits(16)?;

    if bits >> 10 == DCT_ESCAPE {
        reader.skip_bits(6)?;
        let run = reader.read_bits(6)?;
        let level = match reader.read_bits(8)? {
            0x00 => reader.read_bits(8)? as i32,
            0x80 => reader.read_bits(8)? as i32 - 256,
            byte => sign_extend(byte, 8),
        };
        return Ok(RunLevel { run, level });
    }

    let entry = if bits >> DCT_LONG_PREFIX == 0 {
        DCT_LONG_TABLE[(bits & 0xFF) as usize]
    } else if first {
        DCT_FIRST_TABLE[(bits >> 4) as usize]
    } else {
        DCT_NEXT_TABLE[(bits >> 4) as usize]
    };
    if entry.length == 0 {
        return Err(Mpeg1Error::InvalidVlcCode {
            table: VlcTable::DctCoefficient,
            bits,
        });
    }
    reader.skip_bits(u64::from(entry.length))?;
    let level = i32::from(entry.level);
    let level = if reader.read_bit()? { -level } else { level };
    Ok(RunLevel {
        run: u32::from(entry.run),
        level,
    })
}
