//! End-to-end decoder tests on synthetic streams.

mod common;

use std::io::Cursor;
use std::thread;
use std::time::Duration;

use common::*;
use pretty_assertions::assert_eq;

use mpeg1_video::idct::idct8x8;
use mpeg1_video::quant::dequantize_non_intra;
use mpeg1_video::{
    DecodeSummary, DecodedPicture, MotionDirection, Mpeg1Decoder, Mpeg1DecoderConfig, Mpeg1Error,
    NullRenderer, PictureType, VideoRenderer, DEFAULT_INTRA_QUANTIZER_MATRIX,
    DEFAULT_NON_INTRA_QUANTIZER_MATRIX,
};

#[derive(Debug, Default)]
struct Recorder {
    sizes: Vec<(u32, u32)>,
    aspect_ratios: Vec<u8>,
    picture_rates: Vec<u8>,
    bit_rates: Vec<u32>,
}

impl VideoRenderer for Recorder {
    fn set_size(&mut self, width: u32, height: u32) {
        self.sizes.push((width, height));
    }

    fn set_pixel_aspect_ratio(&mut self, code: u8) {
        self.aspect_ratios.push(code);
    }

    fn set_picture_rate(&mut self, code: u8) {
        self.picture_rates.push(code);
    }

    fn set_bit_rate(&mut self, bit_rate: u32) {
        self.bit_rates.push(bit_rate);
    }
}

/// Decode on the calling thread and collect every queued picture.
fn decode_all(stream: Vec<u8>) -> (mpeg1_video::Result<DecodeSummary>, Recorder, Vec<DecodedPicture>) {
    let config = Mpeg1DecoderConfig::default().with_queue_capacity(16);
    let (mut decoder, pictures) = Mpeg1Decoder::with_config(Cursor::new(stream), Recorder::default(), config);
    let result = decoder.decode();
    let recorder = decoder.into_renderer();
    (result, recorder, pictures.into_iter().collect())
}

fn luma_region(picture: &DecodedPicture, x0: usize, y0: usize, size: usize) -> Vec<u8> {
    (y0..y0 + size)
        .flat_map(|y| picture.luma().row(y)[x0..x0 + size].to_vec())
        .collect()
}

// ============================================================================
// Intra pictures
// ============================================================================

#[test]
fn test_two_macroblock_intra_picture() {
    let stream = StreamBuilder::new()
        .sequence_header(32, 16)
        .group(true)
        .picture(0, PictureType::Intra, 0)
        .slice(1, 1)
        .intra_macroblock(INCREMENT_1, [0; 4], 0, 0)
        .intra_macroblock(INCREMENT_1, [0; 4], 0, 0)
        .end();

    let (result, recorder, pictures) = decode_all(stream);
    let summary = result.unwrap();

    assert_eq!(recorder.sizes, vec![(32, 16)]);
    assert_eq!(recorder.aspect_ratios, vec![1]);
    assert_eq!(recorder.picture_rates, vec![3]);
    assert_eq!(recorder.bit_rates, vec![1000]);

    assert_eq!(pictures.len(), 1);
    let picture = &pictures[0];
    assert_eq!(picture.picture_type(), PictureType::Intra);
    assert_eq!((picture.width(), picture.height()), (32, 16));
    assert!(picture.luma().data().iter().all(|&s| s == 128));
    assert!(picture.cb().data().iter().all(|&s| s == 128));

    assert_eq!(summary.intra_pictures, 1);
    assert_eq!(summary.groups_of_pictures, 1);
    assert!(summary.reached_end_code);
}

#[test]
fn test_dc_differentials_chain_through_predictors() {
    let stream = StreamBuilder::new()
        .sequence_header(32, 16)
        .group(true)
        .picture(0, PictureType::Intra, 0)
        .slice(1, 1)
        .intra_macroblock(INCREMENT_1, [5, -3, 0, 0], 2, 0)
        // Adjacent intra macroblock continues from block 3 of the first.
        .intra_macroblock(INCREMENT_1, [1, 0, 0, 0], 0, -1)
        .end();

    let (result, _, pictures) = decode_all(stream);
    result.unwrap();
    let picture = &pictures[0];

    let block0 = dc_sample(1024 + 5 * 8);
    let block1 = dc_sample(1024 + 5 * 8 - 3 * 8);
    assert!(luma_region(picture, 0, 0, 8).iter().all(|&s| s == block0));
    assert!(luma_region(picture, 8, 0, 8).iter().all(|&s| s == block1));
    assert!(luma_region(picture, 0, 8, 8).iter().all(|&s| s == block1));
    assert!(luma_region(picture, 8, 8, 8).iter().all(|&s| s == block1));
    assert!(luma_region(picture, 16, 0, 8)
        .iter()
        .all(|&s| s == dc_sample(1024 + 2 * 8 + 8)));

    assert_eq!(picture.cb().get(0, 0), dc_sample(1024 + 16));
    assert_eq!(picture.cb().get(8, 0), dc_sample(1024 + 16));
    assert_eq!(picture.cr().get(0, 0), 128);
    assert_eq!(picture.cr().get(8, 0), dc_sample(1024 - 8));
}

#[test]
fn test_dc_intra_picture() {
    let stream = StreamBuilder::new()
        .sequence_header(16, 16)
        .group(true)
        .picture(0, PictureType::DcIntra, 0)
        .slice(1, 1)
        .code(INCREMENT_1)
        .code(D_INTRA)
        .intra_blocks([5, 0, 0, 0], 0, 0, false)
        .bits(1, 1) // end_of_macroblock
        .end();

    let (result, _, pictures) = decode_all(stream);
    assert_eq!(result.unwrap().dc_pictures, 1);
    assert_eq!(pictures[0].picture_type(), PictureType::DcIntra);
    assert!(pictures[0].luma().data().iter().all(|&s| s == dc_sample(1064)));
}

#[test]
fn test_intra_ac_coefficients_with_escapes() {
    let stream = StreamBuilder::new()
        .sequence_header(16, 16)
        .group(true)
        .picture(0, PictureType::Intra, 0)
        .slice(1, 2)
        .code(INCREMENT_1)
        .code(I_INTRA)
        .dc_luma(0)
        .coefficient(COEFF_NEXT_1, false)
        .escape(2, 200)
        .escape(0, -200)
        .escape(1, -3)
        .coefficient(COEFF_RUN_1, true)
        .code(END_OF_BLOCK)
        .flat_blocks_after_first()
        .end();

    let (result, _, pictures) = decode_all(stream);
    result.unwrap();
    let picture = &pictures[0];

    let levels = [(1, 1), (4, 200), (5, -200), (7, -3), (9, -1)];
    let expected = intra_samples(1024, &levels, 2, &DEFAULT_INTRA_QUANTIZER_MATRIX);
    assert!(expected.iter().any(|&s| s != expected[0]));
    assert_eq!(luma_region(picture, 0, 0, 8), expected);

    // The other blocks only carry the chained DC.
    assert!(luma_region(picture, 8, 0, 8).iter().all(|&s| s == 128));
    assert!(luma_region(picture, 8, 8, 8).iter().all(|&s| s == 128));
    assert!(picture.cb().data().iter().all(|&s| s == 128));
    assert!(picture.cr().data().iter().all(|&s| s == 128));
}

#[test]
fn test_macroblock_quantizer_overrides_slice() {
    let block = |builder: StreamBuilder| {
        builder
            .dc_luma(0)
            .escape(0, 3)
            .code(END_OF_BLOCK)
            .flat_blocks_after_first()
    };
    let stream = StreamBuilder::new()
        .sequence_header(48, 16)
        .group(true)
        .picture(0, PictureType::Intra, 0)
        .slice(1, 1);
    let stream = block(stream.code(INCREMENT_1).code(I_INTRA));
    let stream = block(stream.code(INCREMENT_1).code(I_INTRA_QUANT).bits(10, 5));
    // The new scale stays in effect for the rest of the slice.
    let stream = block(stream.code(INCREMENT_1).code(I_INTRA)).end();

    let (result, _, pictures) = decode_all(stream);
    result.unwrap();
    let picture = &pictures[0];

    let coarse = intra_samples(1024, &[(1, 3)], 1, &DEFAULT_INTRA_QUANTIZER_MATRIX);
    let fine = intra_samples(1024, &[(1, 3)], 10, &DEFAULT_INTRA_QUANTIZER_MATRIX);
    assert_ne!(coarse, fine);
    assert_eq!(luma_region(picture, 0, 0, 8), coarse);
    assert_eq!(luma_region(picture, 16, 0, 8), fine);
    assert_eq!(luma_region(picture, 32, 0, 8), fine);
}

#[test]
fn test_loaded_quantizer_matrices() {
    let mut intra = DEFAULT_INTRA_QUANTIZER_MATRIX;
    intra[1] = 80;
    let mut non_intra = DEFAULT_NON_INTRA_QUANTIZER_MATRIX;
    non_intra[0] = 40;

    let stream = StreamBuilder::new()
        .sequence_header_with_matrices(16, 16, Some(&intra), Some(&non_intra))
        .group(true)
        .picture(0, PictureType::Intra, 0)
        .slice(1, 1)
        .code(INCREMENT_1)
        .code(I_INTRA)
        .dc_luma(0)
        .coefficient(COEFF_NEXT_1, false)
        .code(END_OF_BLOCK)
        .flat_blocks_after_first()
        .picture(1, PictureType::Predictive, 1)
        .slice(1, 8)
        .code(INCREMENT_1)
        .code(P_PATTERN)
        .code(CBP_BLOCK_3)
        .coefficient(COEFF_FIRST_1, false)
        .code(END_OF_BLOCK)
        .end();

    let config = Mpeg1DecoderConfig::default().with_queue_capacity(16);
    let (mut decoder, pictures) = Mpeg1Decoder::with_config(Cursor::new(stream), NullRenderer, config);
    decoder.decode().unwrap();
    let header = decoder.sequence_header().unwrap();
    assert_eq!((header.width, header.height), (16, 16));
    assert_eq!(header.intra_quantizer_matrix, intra);
    assert_eq!(header.non_intra_quantizer_matrix, non_intra);
    drop(decoder);
    let pictures: Vec<DecodedPicture> = pictures.into_iter().collect();
    let (intra_picture, predicted) = (&pictures[0], &pictures[1]);

    let expected = intra_samples(1024, &[(1, 1)], 1, &intra);
    assert_ne!(
        expected,
        intra_samples(1024, &[(1, 1)], 1, &DEFAULT_INTRA_QUANTIZER_MATRIX)
    );
    assert_eq!(luma_region(intra_picture, 0, 0, 8), expected);

    let mut levels = [0i32; 64];
    levels[0] = 1;
    let mut residual = [0i32; 64];
    dequantize_non_intra(&levels, 8, &non_intra, &mut residual);
    // (2 + 1) * 8 * 40 >> 4 = 60, made odd.
    assert_eq!(residual[0], 59);
    idct8x8(&mut residual);

    let base = intra_picture.luma().get(8, 8);
    assert!(luma_region(intra_picture, 8, 8, 8).iter().all(|&s| s == base));
    for (i, &sample) in luma_region(predicted, 8, 8, 8).iter().enumerate() {
        assert_eq!(i32::from(sample), (i32::from(base) + residual[i]).clamp(0, 255));
    }
}

// ============================================================================
// Predicted pictures
// ============================================================================

#[test]
fn test_p_skipped_macroblocks_copy_previous() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(48, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        3,
        5,
    )
    .picture(1, PictureType::Predictive, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .code(P_FORWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    // Skips macroblock 1.
    .code(INCREMENT_2)
    .code(P_FORWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .end();

    let (result, _, pictures) = decode_all(stream);
    let summary = result.unwrap();
    assert_eq!(summary.intra_pictures, 1);
    assert_eq!(summary.predictive_pictures, 1);

    let (intra, predicted) = (&pictures[0], &pictures[1]);
    assert_eq!(predicted.picture_type(), PictureType::Predictive);
    assert_eq!(predicted.decode_index(), 1);
    assert_eq!(luma_region(predicted, 16, 0, 16), luma_region(intra, 16, 0, 16));
    assert_eq!(predicted.luma(), intra.luma());
    assert_eq!(predicted.cb(), intra.cb());

    // The three macroblocks really differ.
    assert_ne!(intra.luma().get(0, 0), intra.luma().get(16, 0));
    assert_ne!(intra.luma().get(16, 0), intra.luma().get(32, 0));
}

#[test]
fn test_p_half_pel_motion() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(48, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        3,
        5,
    )
    .picture(1, PictureType::Predictive, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .code(P_FORWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    // +1 half sample to the right.
    .code(INCREMENT_1)
    .code(P_FORWARD)
    .code(MOTION_PLUS_1)
    .code(MOTION_ZERO)
    // Back to zero through the predictor.
    .code(INCREMENT_1)
    .code(P_FORWARD)
    .code(MOTION_MINUS_1)
    .code(MOTION_ZERO)
    .end();

    let (result, _, pictures) = decode_all(stream);
    result.unwrap();
    let (intra, predicted) = (&pictures[0], &pictures[1]);

    let left = intra.luma().get(16, 0);
    let right = intra.luma().get(32, 0);
    let average = ((u16::from(left) + u16::from(right) + 1) >> 1) as u8;

    assert_eq!(predicted.luma().get(15, 0), intra.luma().get(15, 0));
    assert_eq!(predicted.luma().get(16, 0), left);
    assert_eq!(predicted.luma().get(30, 5), left);
    assert_eq!(predicted.luma().get(31, 5), average);
    assert_eq!(predicted.luma().get(32, 0), right);
}

#[test]
fn test_p_pattern_adds_residual_to_copy() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(16, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        1,
        5,
    )
    .picture(1, PictureType::Predictive, 1)
    .slice(1, 8)
    .code(INCREMENT_1)
    .code(P_PATTERN)
    .code(CBP_BLOCK_3)
    .code(COEFF_FIRST_1)
    .bits(0, 1) // positive
    .code(END_OF_BLOCK)
    .end();

    let (result, _, pictures) = decode_all(stream);
    result.unwrap();
    let (intra, predicted) = (&pictures[0], &pictures[1]);

    let mut levels = [0i32; 64];
    levels[0] = 1;
    let mut residual = [0i32; 64];
    dequantize_non_intra(&levels, 8, &DEFAULT_NON_INTRA_QUANTIZER_MATRIX, &mut residual);
    idct8x8(&mut residual);
    assert!(residual[0] > 0);

    assert_eq!(luma_region(predicted, 0, 0, 8), luma_region(intra, 0, 0, 8));
    let base = i32::from(intra.luma().get(8, 8));
    for (i, &sample) in luma_region(predicted, 8, 8, 8).iter().enumerate() {
        assert_eq!(i32::from(sample), base + residual[i]);
    }
}

#[test]
fn test_p_motion_residual_with_larger_f_code() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(48, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        3,
        5,
    )
    .picture(1, PictureType::Predictive, 2)
    .slice(1, 1)
    // f = 2: code +1 with residual 0 is one half sample.
    .code(INCREMENT_1)
    .code(P_FORWARD)
    .code(MOTION_PLUS_1)
    .bits(0, 1)
    .code(MOTION_ZERO)
    // Code +1 with residual 1 adds two: three half samples.
    .code(INCREMENT_1)
    .code(P_FORWARD)
    .code(MOTION_PLUS_1)
    .bits(1, 1)
    .code(MOTION_ZERO)
    // Code -2 with residual 1 subtracts four: one half sample left.
    .code(INCREMENT_1)
    .code(P_FORWARD)
    .code(MOTION_MINUS_2)
    .bits(1, 1)
    .code(MOTION_ZERO)
    .end();

    let (result, _, pictures) = decode_all(stream);
    result.unwrap();
    let (intra, predicted) = (&pictures[0], &pictures[1]);

    let reference = intra.luma().row(0);
    let (a, b, c) = (reference[0], reference[16], reference[32]);
    assert!(a != b && b != c);
    let expected: Vec<u8> = (0..48)
        .map(|x| match x {
            0..=14 => a,
            15 => average(a, b),
            16..=29 => b,
            30 => average(b, c),
            31 => c,
            32 => average(b, c),
            _ => c,
        })
        .collect();
    assert_eq!(predicted.luma().row(0)[..48].to_vec(), expected);
    assert_eq!(predicted.luma().row(15)[..48].to_vec(), expected);
}

#[test]
fn test_p_negative_vector_halves_chroma_downwards() {
    let stream = StreamBuilder::new()
        .sequence_header(32, 16)
        .group(true)
        .picture(0, PictureType::Intra, 0)
        .slice(1, 1)
        .intra_macroblock(INCREMENT_1, [5, 0, 0, 0], 4, 0)
        .intra_macroblock(INCREMENT_1, [5, 0, 0, 0], -4, 0)
        .picture(1, PictureType::Predictive, 1)
        .slice(1, 1)
        .code(INCREMENT_1)
        .code(P_FORWARD)
        .code(MOTION_ZERO)
        .code(MOTION_ZERO)
        // One half sample to the left.
        .code(INCREMENT_1)
        .code(P_FORWARD)
        .code(MOTION_MINUS_1)
        .code(MOTION_ZERO)
        .end();

    let (result, _, pictures) = decode_all(stream);
    result.unwrap();
    let (intra, predicted) = (&pictures[0], &pictures[1]);

    let (a, b) = (dc_sample(1064), dc_sample(1104));
    assert_eq!((intra.luma().get(15, 0), intra.luma().get(16, 0)), (a, b));
    assert_eq!(predicted.luma().get(15, 3), a);
    assert_eq!(predicted.luma().get(16, 3), average(a, b));
    assert_eq!(predicted.luma().get(17, 3), b);

    // The chroma vector is -1 >> 1 = -1: still half a sample to the left.
    let (left, right) = (dc_sample(1056), dc_sample(1024));
    assert_eq!((intra.cb().get(7, 0), intra.cb().get(8, 0)), (left, right));
    assert_eq!(predicted.cb().get(7, 5), left);
    assert_eq!(predicted.cb().get(8, 5), average(left, right));
    assert_eq!(predicted.cb().get(9, 5), right);
    assert!(predicted.cr().data().iter().all(|&s| s == 128));
}

// ============================================================================
// Bidirectional pictures
// ============================================================================

#[test]
fn test_b_interpolates_between_references() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(16, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        1,
        5,
    )
    .picture(2, PictureType::Predictive, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .code(P_INTRA)
    .intra_blocks([-5, 0, 0, 0], 0, 0, true)
    .picture(1, PictureType::Bidirectional, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .code(B_INTERPOLATED)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .end();

    let (result, _, pictures) = decode_all(stream);
    let summary = result.unwrap();
    assert_eq!(summary.pictures(), 3);

    let types: Vec<PictureType> = pictures.iter().map(|p| p.picture_type()).collect();
    assert_eq!(
        types,
        vec![
            PictureType::Intra,
            PictureType::Predictive,
            PictureType::Bidirectional
        ]
    );
    let temporal: Vec<u16> = pictures.iter().map(|p| p.temporal_reference()).collect();
    assert_eq!(temporal, vec![0, 2, 1]);

    let forward = u16::from(dc_sample(1024 + 40));
    let backward = u16::from(dc_sample(1024 - 40));
    let expected = ((forward + backward + 1) >> 1) as u8;
    assert!(pictures[2].luma().data().iter().all(|&s| s == expected));
}

#[test]
fn test_b_skipped_run_repeats_interpolation() {
    let mut stream = intra_row(
        StreamBuilder::new()
            .sequence_header(64, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        4,
        5,
    )
    .picture(3, PictureType::Predictive, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .code(P_INTRA)
    .intra_blocks([-5, 0, 0, 0], 0, 0, true);
    for _ in 1..4 {
        stream = stream
            .code(INCREMENT_1)
            .code(P_INTRA)
            .intra_blocks([0; 4], 0, 0, true);
    }
    let stream = stream
        .picture(1, PictureType::Bidirectional, 1)
        .slice(1, 1)
        // Forward half a sample right, backward zero.
        .code(INCREMENT_1)
        .code(B_INTERPOLATED)
        .code(MOTION_PLUS_1)
        .code(MOTION_ZERO)
        .code(MOTION_ZERO)
        .code(MOTION_ZERO)
        // Macroblocks 1 and 2 are skipped.
        .code(INCREMENT_3)
        .code(B_INTERPOLATED)
        .code(MOTION_MINUS_1)
        .code(MOTION_ZERO)
        .code(MOTION_ZERO)
        .code(MOTION_ZERO)
        .end();

    let (result, _, pictures) = decode_all(stream);
    assert_eq!(result.unwrap().bidirectional_pictures, 1);

    let reference = pictures[0].luma().row(0);
    assert!(reference[15] != reference[16] && reference[47] != reference[48]);
    let backward = dc_sample(984);
    assert!(pictures[1].luma().data().iter().all(|&s| s == backward));

    let expected: Vec<u8> = (0..64)
        .map(|x| {
            let forward = if x < 48 {
                average(reference[x], reference[x + 1])
            } else {
                reference[x]
            };
            average(forward, backward)
        })
        .collect();
    let bidirectional = &pictures[2];
    assert_eq!(bidirectional.picture_type(), PictureType::Bidirectional);
    assert_eq!(bidirectional.luma().row(0)[..64].to_vec(), expected);
    assert_eq!(bidirectional.luma().row(9)[..64].to_vec(), expected);
}

#[test]
fn test_b_with_single_reference_predicts_backward() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(48, 16)
            .group(true)
            .picture(2, PictureType::Intra, 0),
        3,
        5,
    )
    .picture(0, PictureType::Bidirectional, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .code(B_BACKWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    // Skipped macroblocks repeat the backward prediction.
    .code(INCREMENT_3)
    .code(B_BACKWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .end();

    // Address 3 is past the last macroblock of a three-macroblock row.
    let (result, _, _) = decode_all(stream);
    assert!(matches!(
        result,
        Err(Mpeg1Error::MacroblockAddressOutOfRange { address: 3, count: 3 })
    ));

    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(48, 16)
            .group(true)
            .picture(2, PictureType::Intra, 0),
        3,
        5,
    )
    .picture(0, PictureType::Bidirectional, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .code(B_BACKWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .code(INCREMENT_2)
    .code(B_BACKWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .end();

    let (result, _, pictures) = decode_all(stream);
    result.unwrap();
    assert_eq!(pictures[1].luma(), pictures[0].luma());
}

#[test]
fn test_b_forward_needs_two_references() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(16, 16)
            .group(true)
            .picture(1, PictureType::Intra, 0),
        1,
        0,
    )
    .picture(0, PictureType::Bidirectional, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .code(B_FORWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .end();

    let (result, _, pictures) = decode_all(stream);
    assert!(matches!(
        result,
        Err(Mpeg1Error::MissingReference(PictureType::Bidirectional))
    ));
    // The broken picture is never queued.
    assert_eq!(pictures.len(), 1);
}

#[test]
fn test_b_skip_after_intra_is_rejected() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(48, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        3,
        0,
    )
    .picture(1, PictureType::Bidirectional, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .bits(0b0001_1, 5) // intra
    .intra_blocks([0; 4], 0, 0, true)
    .code(INCREMENT_2)
    .code(B_BACKWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .end();

    let (result, _, _) = decode_all(stream);
    assert!(matches!(result, Err(Mpeg1Error::SkipAfterIntra)));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_p_without_reference() {
    let stream = StreamBuilder::new()
        .sequence_header(16, 16)
        .group(false)
        .picture(0, PictureType::Predictive, 1)
        .slice(1, 1)
        .code(INCREMENT_1)
        .code(P_FORWARD)
        .code(MOTION_ZERO)
        .code(MOTION_ZERO)
        .end();

    let (result, _, pictures) = decode_all(stream);
    assert!(matches!(
        result,
        Err(Mpeg1Error::MissingReference(PictureType::Predictive))
    ));
    assert!(pictures.is_empty());
}

#[test]
fn test_zero_f_code() {
    let stream = StreamBuilder::new()
        .sequence_header(16, 16)
        .group(false)
        .picture(0, PictureType::Predictive, 0)
        .slice(1, 1)
        .end();

    let (result, _, _) = decode_all(stream);
    assert!(matches!(
        result,
        Err(Mpeg1Error::InvalidFCode {
            direction: MotionDirection::Forward
        })
    ));
}

#[test]
fn test_closed_gop_drops_references() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(16, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        1,
        0,
    )
    .group(true)
    .picture(0, PictureType::Predictive, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .code(P_FORWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .end();

    let (result, _, _) = decode_all(stream);
    assert!(matches!(
        result,
        Err(Mpeg1Error::MissingReference(PictureType::Predictive))
    ));
}

#[test]
fn test_invalid_dimensions() {
    let stream = StreamBuilder::new().sequence_header(0, 16).end();
    let (result, recorder, _) = decode_all(stream);
    assert!(matches!(
        result,
        Err(Mpeg1Error::InvalidDimensions { width: 0, height: 16 })
    ));
    assert!(recorder.sizes.is_empty());

    let stream = StreamBuilder::new().sequence_header(352, 288).end();
    let config = Mpeg1DecoderConfig::default().with_max_dimensions(320, 240);
    let (mut decoder, _pictures) = Mpeg1Decoder::with_config(Cursor::new(stream), NullRenderer, config);
    assert!(matches!(
        decoder.decode(),
        Err(Mpeg1Error::InvalidDimensions { width: 352, height: 288 })
    ));
}

#[test]
fn test_picture_outside_group_is_unexpected() {
    let stream = StreamBuilder::new()
        .sequence_header(16, 16)
        .picture(0, PictureType::Intra, 0)
        .end();
    let (result, _, _) = decode_all(stream);
    assert!(matches!(result, Err(Mpeg1Error::UnexpectedStartCode(0x100))));
}

#[test]
fn test_slice_below_picture() {
    let stream = StreamBuilder::new()
        .sequence_header(16, 16)
        .group(true)
        .picture(0, PictureType::Intra, 0)
        .slice(2, 1)
        .intra_macroblock(INCREMENT_1, [0; 4], 0, 0)
        .end();
    let (result, _, _) = decode_all(stream);
    assert!(matches!(
        result,
        Err(Mpeg1Error::MacroblockAddressOutOfRange { address: 1, count: 1 })
    ));
}

#[test]
fn test_truncated_picture_header() {
    let stream = StreamBuilder::new()
        .sequence_header(16, 16)
        .group(true)
        .start_code(0x00)
        .bits(0, 10)
        .bits(u32::from(PictureType::Intra.code()), 3)
        // Ends inside vbv_delay.
        .finish();

    let (result, _, pictures) = decode_all(stream);
    assert!(matches!(result, Err(Mpeg1Error::UnexpectedEndOfStream)));
    assert!(pictures.is_empty());
}

// ============================================================================
// Stream structure
// ============================================================================

#[test]
fn test_leading_garbage_and_missing_end_code() {
    let stream = intra_row(
        StreamBuilder::new()
            .bits(0xDEAD, 16)
            .start_code(0xB2)
            .bits(0x55, 8)
            .sequence_header(16, 16)
            .start_code(0xB5)
            .bits(0x1234, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        1,
        0,
    )
    .finish();

    let (result, _, pictures) = decode_all(stream);
    let summary = result.unwrap();
    assert!(!summary.reached_end_code);
    assert_eq!(pictures.len(), 1);
}

#[test]
fn test_repeated_sequence_header_keeps_references() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(16, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        1,
        5,
    )
    .sequence_header(16, 16)
    .group(false)
    .picture(1, PictureType::Predictive, 1)
    .slice(1, 1)
    .code(INCREMENT_1)
    .code(P_FORWARD)
    .code(MOTION_ZERO)
    .code(MOTION_ZERO)
    .end();

    let (result, recorder, pictures) = decode_all(stream);
    let summary = result.unwrap();
    assert_eq!(summary.sequence_headers, 2);
    assert_eq!(recorder.sizes, vec![(16, 16), (16, 16)]);
    assert_eq!(pictures[1].luma(), pictures[0].luma());
}

#[test]
fn test_new_picture_size_reallocates() {
    let stream = intra_row(
        StreamBuilder::new()
            .sequence_header(16, 16)
            .group(true)
            .picture(0, PictureType::Intra, 0),
        1,
        0,
    );
    let stream = intra_row(
        stream.sequence_header(32, 16).group(true).picture(0, PictureType::Intra, 0),
        2,
        0,
    )
    .end();

    let (result, recorder, pictures) = decode_all(stream);
    result.unwrap();
    assert_eq!(recorder.sizes, vec![(16, 16), (32, 16)]);
    assert_eq!(pictures[1].luma().width(), 32);
    assert_eq!(pictures[1].width(), 32);
}

// ============================================================================
// Threaded decoding
// ============================================================================

fn intra_stream(pictures: u32) -> Vec<u8> {
    let mut builder = StreamBuilder::new().sequence_header(16, 16).group(true);
    for i in 0..pictures {
        builder = intra_row(builder.picture(i, PictureType::Intra, 0), 1, 0);
    }
    builder.end()
}

#[test]
fn test_spawned_decoder_blocks_on_full_queue() {
    let config = Mpeg1DecoderConfig::default();
    let (pictures, handle) =
        Mpeg1Decoder::spawn(Cursor::new(intra_stream(5)), NullRenderer, config).unwrap();

    while pictures.len() < 3 {
        thread::sleep(Duration::from_millis(1));
    }
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pictures.len(), 3);
    assert!(!handle.is_finished());

    let indices: Vec<u64> = pictures.into_iter().map(|p| p.decode_index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.intra_pictures, 5);
}

#[test]
fn test_consumer_hang_up_stops_decoder() {
    let config = Mpeg1DecoderConfig::default().with_queue_capacity(1);
    let (pictures, handle) =
        Mpeg1Decoder::spawn(Cursor::new(intra_stream(4)), NullRenderer, config).unwrap();

    let first = pictures.recv().unwrap();
    assert_eq!(first.decode_index(), 0);
    drop(pictures);

    let err = handle.join().unwrap().unwrap_err();
    assert!(matches!(err, Mpeg1Error::OutputClosed));
    assert!(!err.is_fatal());
}
