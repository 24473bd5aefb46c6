//! Start code scanning and header parsing.
//!
//! Every parse function expects the reader to sit just past the 32-bit
//! start code of its unit.

use std::io::Read;

use mpeg1_core::bitstream::find_start_code;
use mpeg1_core::BitReader;
use tracing::warn;

use crate::error::{Mpeg1Error, Result};
use crate::types::*;

/// Align to a byte boundary and discard bytes up to the next start code.
///
/// The start code is peeked, not consumed. Returns `None` if the stream ends
/// before another start code.
pub fn next_start_code<R: Read>(reader: &mut BitReader<R>) -> Result<Option<u32>> {
    reader.align_to_byte();
    loop {
        match reader.try_peek_bits(32)? {
            None => return Ok(None),
            Some(code) if code >> 8 == START_CODE_PREFIX => return Ok(Some(code)),
            Some(_) => reader.skip_bits(8)?,
        }
    }
}

/// Skip any extension and user data regions.
///
/// Returns the first start code that follows them, still unconsumed.
pub fn skip_extension_and_user_data<R: Read>(reader: &mut BitReader<R>) -> Result<Option<u32>> {
    loop {
        match next_start_code(reader)? {
            Some(EXTENSION_START_CODE | USER_DATA_START_CODE) => reader.skip_bits(32)?,
            other => return Ok(other),
        }
    }
}

fn read_quantizer_matrix<R: Read>(reader: &mut BitReader<R>) -> Result<[u8; 64]> {
    let mut matrix = [0u8; 64];
    for &position in ZIGZAG_SCAN.iter() {
        matrix[position] = reader.read_bits(8)? as u8;
    }
    Ok(matrix)
}

/// Parse a sequence header.
pub fn parse_sequence_header<R: Read>(reader: &mut BitReader<R>) -> Result<SequenceHeader> {
    let width = reader.read_bits(12)? as u16;
    let height = reader.read_bits(12)? as u16;
    let aspect_ratio_code = reader.read_bits(4)? as u8;
    let picture_rate_code = reader.read_bits(4)? as u8;
    let bit_rate = reader.read_bits(18)?;
    if !reader.read_bit()? {
        warn!("Sequence header marker bit not set");
    }
    let vbv_buffer_size = reader.read_bits(10)? as u16;
    let constrained_parameters = reader.read_bit()?;

    let intra_quantizer_matrix = if reader.read_bit()? {
        read_quantizer_matrix(reader)?
    } else {
        DEFAULT_INTRA_QUANTIZER_MATRIX
    };
    let non_intra_quantizer_matrix = if reader.read_bit()? {
        read_quantizer_matrix(reader)?
    } else {
        DEFAULT_NON_INTRA_QUANTIZER_MATRIX
    };

    Ok(SequenceHeader {
        width,
        height,
        aspect_ratio_code,
        picture_rate_code,
        bit_rate,
        vbv_buffer_size,
        constrained_parameters,
        intra_quantizer_matrix,
        non_intra_quantizer_matrix,
    })
}

/// Parse a group of pictures header.
pub fn parse_group_of_pictures<R: Read>(reader: &mut BitReader<R>) -> Result<GroupOfPictures> {
    let bits = reader.read_bits(25)?;
    if (bits >> 12) & 1 == 0 {
        warn!("Time code marker bit not set");
    }
    Ok(GroupOfPictures {
        time_code: TimeCode::from_bits(bits),
        closed_gop: reader.read_bit()?,
        broken_link: reader.read_bit()?,
    })
}

fn read_motion_code<R: Read>(
    reader: &mut BitReader<R>,
    direction: MotionDirection,
) -> Result<MotionCode> {
    let full_pel = reader.read_bit()?;
    let f_code = reader.read_bits(3)? as u8;
    if f_code == 0 {
        return Err(Mpeg1Error::InvalidFCode { direction });
    }
    Ok(MotionCode { full_pel, f_code })
}

/// Parse a picture header, including its extra information bytes.
pub fn parse_picture_header<R: Read>(reader: &mut BitReader<R>) -> Result<PictureHeader> {
    let temporal_reference = reader.read_bits(10)? as u16;
    let type_code = reader.read_bits(3)? as u8;
    let picture_type =
        PictureType::from_code(type_code).ok_or(Mpeg1Error::InvalidPictureType(type_code))?;
    let vbv_delay = reader.read_bits(16)? as u16;

    let forward = match picture_type {
        PictureType::Predictive | PictureType::Bidirectional => {
            Some(read_motion_code(reader, MotionDirection::Forward)?)
        }
        _ => None,
    };
    let backward = match picture_type {
        PictureType::Bidirectional => Some(read_motion_code(reader, MotionDirection::Backward)?),
        _ => None,
    };

    skip_extra_information(reader)?;

    Ok(PictureHeader {
        temporal_reference,
        picture_type,
        vbv_delay,
        forward,
        backward,
    })
}

/// Skip `extra_bit` flagged bytes.
pub fn skip_extra_information<R: Read>(reader: &mut BitReader<R>) -> Result<()> {
    while reader.read_bit()? {
        reader.skip_bits(8)?;
    }
    Ok(())
}

/// Find and parse the first sequence header in a byte buffer.
pub fn probe_sequence_header(data: &[u8]) -> Result<SequenceHeader> {
    let mut offset = 0;
    while let Some(pos) = find_start_code(&data[offset..]) {
        let code_at = offset + pos + 3;
        match data.get(code_at) {
            Some(&id) if u32::from(id) | 0x100 == SEQUENCE_HEADER_CODE => {
                let mut reader = BitReader::new(&data[code_at + 1..]);
                return parse_sequence_header(&mut reader);
            }
            Some(_) => offset = code_at,
            None => break,
        }
    }
    Err(Mpeg1Error::UnexpectedEndOfStream)
}
