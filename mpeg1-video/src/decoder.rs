//! MPEG-1 video decode driver.
//!
//! [`Mpeg1Decoder`] walks the layers of the stream (sequence, group of
//! pictures, picture, slice, macroblock, block), reconstructs every picture in
//! a three-slot [`PictureStore`] and hands a snapshot of each finished picture
//! to a bounded queue in coding order.

use std::io::Read;
use std::thread::{self, JoinHandle};

use mpeg1_core::bitstream::DEFAULT_BUFFER_SIZE;
use mpeg1_core::BitReader;
use tracing::{debug, info, trace, warn};

use crate::error::{Mpeg1Error, Result};
use crate::idct::idct8x8;
use crate::motion::MotionVector;
use crate::output::{picture_queue, DecodedPicture, PictureReceiver, PictureSender, DEFAULT_QUEUE_CAPACITY};
use crate::parser::{
    next_start_code, parse_group_of_pictures, parse_picture_header, parse_sequence_header,
    skip_extension_and_user_data, skip_extra_information,
};
use crate::picture::{Picture, PictureStore};
use crate::quant::{dequantize_intra, dequantize_non_intra, Component, DcPredictor};
use crate::renderer::VideoRenderer;
use crate::types::*;
use crate::vlc::{
    is_end_of_block, read_coded_block_pattern, read_dc_differential, read_dc_size_chroma,
    read_dc_size_luma, read_dct_coefficient, read_macroblock_address_increment,
    read_macroblock_type, read_motion_code, skip_end_of_block, MacroblockType,
};

/// Largest picture dimension the 12-bit size fields can express.
pub const MAX_DIMENSION: u32 = 4095;

/// MPEG-1 decoder configuration.
#[derive(Debug, Clone)]
pub struct Mpeg1DecoderConfig {
    /// Pictures the output queue holds before the decoder blocks.
    pub queue_capacity: usize,
    /// Maximum accepted width.
    pub max_width: u32,
    /// Maximum accepted height.
    pub max_height: u32,
    /// Size of the bit reader's refill buffer in bytes.
    pub read_buffer_size: usize,
}

impl Default for Mpeg1DecoderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_width: MAX_DIMENSION,
            max_height: MAX_DIMENSION,
            read_buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl Mpeg1DecoderConfig {
    /// Set the output queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the largest accepted picture size.
    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_width = width;
        self.max_height = height;
        self
    }

    /// Set the bit reader buffer size.
    pub fn with_read_buffer_size(mut self, bytes: usize) -> Self {
        self.read_buffer_size = bytes;
        self
    }
}

/// Counters collected while decoding a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Sequence headers seen.
    pub sequence_headers: u64,
    /// Group of pictures headers seen.
    pub groups_of_pictures: u64,
    /// I pictures decoded.
    pub intra_pictures: u64,
    /// P pictures decoded.
    pub predictive_pictures: u64,
    /// B pictures decoded.
    pub bidirectional_pictures: u64,
    /// D pictures decoded.
    pub dc_pictures: u64,
    /// The stream was terminated by a sequence end code.
    pub reached_end_code: bool,
}

impl DecodeSummary {
    /// Total number of pictures decoded.
    pub fn pictures(&self) -> u64 {
        self.intra_pictures + self.predictive_pictures + self.bidirectional_pictures + self.dc_pictures
    }

    fn count(&mut self, picture_type: PictureType) {
        match picture_type {
            PictureType::Intra => self.intra_pictures += 1,
            PictureType::Predictive => self.predictive_pictures += 1,
            PictureType::Bidirectional => self.bidirectional_pictures += 1,
            PictureType::DcIntra => self.dc_pictures += 1,
        }
    }
}

/// MPEG-1 video decoder.
///
/// # Example
///
/// ```rust,ignore
/// use mpeg1_video::{Mpeg1Decoder, Mpeg1DecoderConfig, NullRenderer};
///
/// let file = std::fs::File::open("clip.m1v")?;
/// let (pictures, handle) = Mpeg1Decoder::spawn(file, NullRenderer, Mpeg1DecoderConfig::default())?;
/// for picture in pictures {
///     println!("{} {}", picture.picture_type(), picture.temporal_reference());
/// }
/// let summary = handle.join().expect("decoder thread panicked")?;
/// ```
pub struct Mpeg1Decoder<R, Rd> {
    reader: BitReader<R>,
    renderer: Rd,
    output: PictureSender,
    config: Mpeg1DecoderConfig,
    sequence: Option<SequenceHeader>,
    store: Option<PictureStore>,
    summary: DecodeSummary,
}

impl<R: Read, Rd: VideoRenderer> Mpeg1Decoder<R, Rd> {
    /// Create a decoder with default configuration and its output queue.
    pub fn new(source: R, renderer: Rd) -> (Self, PictureReceiver) {
        Self::with_config(source, renderer, Mpeg1DecoderConfig::default())
    }

    /// Create a decoder and its output queue.
    pub fn with_config(source: R, renderer: Rd, config: Mpeg1DecoderConfig) -> (Self, PictureReceiver) {
        let (sender, receiver) = picture_queue(config.queue_capacity);
        (Self::with_output(source, renderer, sender, config), receiver)
    }

    /// Create a decoder that sends pictures to an existing queue.
    pub fn with_output(
        source: R,
        renderer: Rd,
        output: PictureSender,
        config: Mpeg1DecoderConfig,
    ) -> Self {
        Self {
            reader: BitReader::with_capacity(source, config.read_buffer_size),
            renderer,
            output,
            config,
            sequence: None,
            store: None,
            summary: DecodeSummary::default(),
        }
    }

    /// Decoder configuration.
    pub fn config(&self) -> &Mpeg1DecoderConfig {
        &self.config
    }

    /// The sequence header in effect.
    pub fn sequence_header(&self) -> Option<&SequenceHeader> {
        self.sequence.as_ref()
    }

    /// Counters so far.
    pub fn summary(&self) -> &DecodeSummary {
        &self.summary
    }

    /// Borrow the renderer.
    pub fn renderer(&self) -> &Rd {
        &self.renderer
    }

    /// Drop the decoder, closing the output queue, and return the renderer.
    pub fn into_renderer(self) -> Rd {
        self.renderer
    }

    /// Decode the whole stream.
    ///
    /// Data before the first sequence header is skipped. Decoding stops at
    /// the sequence end code or at the end of the input, and aborts on the
    /// first error; a picture is only queued once it is complete.
    pub fn decode(&mut self) -> Result<DecodeSummary> {
        loop {
            match next_start_code(&mut self.reader)? {
                Some(SEQUENCE_HEADER_CODE) => break,
                Some(_) => self.reader.skip_bits(32)?,
                None => return Err(Mpeg1Error::UnexpectedEndOfStream),
            }
        }

        loop {
            match next_start_code(&mut self.reader)? {
                Some(SEQUENCE_HEADER_CODE) => {
                    self.reader.skip_bits(32)?;
                    self.parse_sequence()?;
                }
                Some(GROUP_START_CODE) => {
                    self.reader.skip_bits(32)?;
                    self.group_of_pictures()?;
                }
                Some(EXTENSION_START_CODE | USER_DATA_START_CODE) => {
                    skip_extension_and_user_data(&mut self.reader)?;
                }
                Some(SEQUENCE_END_CODE) => {
                    self.reader.skip_bits(32)?;
                    self.summary.reached_end_code = true;
                    break;
                }
                Some(code) => return Err(Mpeg1Error::UnexpectedStartCode(code)),
                None => {
                    warn!("Stream ended without a sequence end code");
                    break;
                }
            }
        }

        info!(
            pictures = self.summary.pictures(),
            sequence_headers = self.summary.sequence_headers,
            groups = self.summary.groups_of_pictures,
            "Decode finished"
        );
        Ok(self.summary.clone())
    }

    fn parse_sequence(&mut self) -> Result<()> {
        let header = parse_sequence_header(&mut self.reader)?;
        let (width, height) = (u32::from(header.width), u32::from(header.height));
        if width == 0 || height == 0 || width > self.config.max_width || height > self.config.max_height {
            return Err(Mpeg1Error::InvalidDimensions { width, height });
        }

        debug!(
            width = width,
            height = height,
            aspect_ratio_code = header.aspect_ratio_code,
            picture_rate_code = header.picture_rate_code,
            bit_rate = header.bit_rate,
            "Parsed sequence header"
        );

        self.renderer.set_size(width, height);
        self.renderer.set_pixel_aspect_ratio(header.aspect_ratio_code);
        self.renderer.set_picture_rate(header.picture_rate_code);
        self.renderer.set_bit_rate(header.bit_rate);

        let same_size = self
            .sequence
            .as_ref()
            .is_some_and(|s| s.width == header.width && s.height == header.height);
        if !same_size || self.store.is_none() {
            self.store = Some(PictureStore::new(header.mb_width(), header.mb_height()));
        }
        self.sequence = Some(header);
        self.summary.sequence_headers += 1;

        skip_extension_and_user_data(&mut self.reader)?;
        Ok(())
    }

    fn group_of_pictures(&mut self) -> Result<()> {
        let gop = parse_group_of_pictures(&mut self.reader)?;
        debug!(
            time_code = %gop.time_code,
            closed = gop.closed_gop,
            broken_link = gop.broken_link,
            "Group of pictures"
        );
        if gop.closed_gop {
            if let Some(store) = self.store.as_mut() {
                store.clear_references();
            }
        }
        self.summary.groups_of_pictures += 1;

        let mut code = skip_extension_and_user_data(&mut self.reader)?;
        while code == Some(PICTURE_START_CODE) {
            self.reader.skip_bits(32)?;
            self.picture()?;
            code = next_start_code(&mut self.reader)?;
        }
        Ok(())
    }

    fn picture(&mut self) -> Result<()> {
        let header = parse_picture_header(&mut self.reader)?;
        let (Some(sequence), Some(store)) = (self.sequence.as_ref(), self.store.as_mut()) else {
            return Err(Mpeg1Error::UnexpectedStartCode(PICTURE_START_CODE));
        };
        let picture_type = header.picture_type;
        debug!(
            temporal_reference = header.temporal_reference,
            picture_type = %picture_type,
            "Picture"
        );

        if picture_type.is_reference() {
            store.promote_future();
        }

        let mut code = skip_extension_and_user_data(&mut self.reader)?;
        match code {
            Some(c) if is_slice_start_code(c) => {}
            Some(c) => return Err(Mpeg1Error::UnexpectedStartCode(c)),
            None => return Err(Mpeg1Error::UnexpectedEndOfStream),
        }
        {
            let (current, previous, future) = store.split();
            let (forward_ref, backward_ref) = match picture_type {
                PictureType::Predictive => (
                    Some(previous.ok_or(Mpeg1Error::MissingReference(picture_type))?),
                    None,
                ),
                PictureType::Bidirectional => match (previous, future) {
                    (Some(p), Some(f)) => (Some(p), Some(f)),
                    // Only one reference since a closed GOP: it lies ahead in
                    // display order.
                    (Some(p), None) => (None, Some(p)),
                    _ => return Err(Mpeg1Error::MissingReference(picture_type)),
                },
                PictureType::Intra | PictureType::DcIntra => (None, None),
            };

            let mut slices = SliceDecoder::new(
                &mut self.reader,
                sequence,
                &header,
                current,
                forward_ref,
                backward_ref,
            );
            while let Some(c) = code.filter(|&c| is_slice_start_code(c)) {
                slices.reader.skip_bits(32)?;
                slices.decode_slice(c)?;
                code = next_start_code(slices.reader)?;
            }
        }

        let decoded = DecodedPicture::new(
            store.current(),
            &header,
            u32::from(sequence.width),
            u32::from(sequence.height),
            self.summary.pictures(),
        );
        self.output.send(decoded)?;
        self.summary.count(picture_type);

        if picture_type.is_reference() {
            store.advance();
        }
        Ok(())
    }
}

impl<R, Rd> Mpeg1Decoder<R, Rd>
where
    R: Read + Send + 'static,
    Rd: VideoRenderer + 'static,
{
    /// Decode on a worker thread.
    ///
    /// Returns the consumer side of the picture queue and the handle of the
    /// worker, which yields the decode summary or the error that stopped it.
    pub fn spawn(
        source: R,
        renderer: Rd,
        config: Mpeg1DecoderConfig,
    ) -> Result<(PictureReceiver, JoinHandle<Result<DecodeSummary>>)> {
        let (mut decoder, receiver) = Self::with_config(source, renderer, config);
        let handle = thread::Builder::new()
            .name("mpeg1-decode".into())
            .spawn(move || decoder.decode())?;
        Ok((receiver, handle))
    }
}

/// Per-picture state for decoding slices, macroblocks and blocks.
struct SliceDecoder<'a, R> {
    reader: &'a mut BitReader<R>,
    sequence: &'a SequenceHeader,
    picture_type: PictureType,
    forward_code: Option<MotionCode>,
    backward_code: Option<MotionCode>,
    current: &'a mut Picture,
    forward_ref: Option<&'a Picture>,
    backward_ref: Option<&'a Picture>,
    forward: MotionVector,
    backward: MotionVector,
    dc: DcPredictor,
    quantizer_scale: i32,
    address: i64,
    last_type: MacroblockType,
    coefficients: [i32; 64],
    block: [i32; 64],
}

impl<'a, R: Read> SliceDecoder<'a, R> {
    fn new(
        reader: &'a mut BitReader<R>,
        sequence: &'a SequenceHeader,
        header: &PictureHeader,
        current: &'a mut Picture,
        forward_ref: Option<&'a Picture>,
        backward_ref: Option<&'a Picture>,
    ) -> Self {
        let mut forward = MotionVector::new();
        let mut backward = MotionVector::new();
        if let Some(code) = header.forward {
            forward.set_code(code);
        }
        if let Some(code) = header.backward {
            backward.set_code(code);
        }
        Self {
            reader,
            sequence,
            picture_type: header.picture_type,
            forward_code: header.forward,
            backward_code: header.backward,
            current,
            forward_ref,
            backward_ref,
            forward,
            backward,
            dc: DcPredictor::new(),
            quantizer_scale: 1,
            address: -1,
            last_type: MacroblockType::empty(),
            coefficients: [0; 64],
            block: [0; 64],
        }
    }

    fn decode_slice(&mut self, code: u32) -> Result<()> {
        let vertical_position = i64::from(code & 0xFF);
        self.address = (vertical_position - 1) * self.current.mb_width() as i64 - 1;
        self.dc.reset_slice();
        self.forward.reset();
        self.backward.reset();
        self.last_type = MacroblockType::empty();

        self.quantizer_scale = self.reader.read_bits(5)? as i32;
        skip_extra_information(self.reader)?;
        trace!(
            vertical_position = vertical_position,
            quantizer_scale = self.quantizer_scale,
            "Slice"
        );

        let mut first = true;
        loop {
            self.decode_macroblock(first)?;
            first = false;
            match self.reader.try_peek_bits(23)? {
                Some(0) | None => break,
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn reference(&self, reference: Option<&'a Picture>) -> Result<&'a Picture> {
        reference.ok_or(Mpeg1Error::MissingReference(self.picture_type))
    }

    fn decode_macroblock(&mut self, first: bool) -> Result<()> {
        let increment = i64::from(read_macroblock_address_increment(self.reader)?);
        let address = self.address + increment;
        let count = self.current.mb_count();
        if address < 0 || address >= count as i64 {
            return Err(Mpeg1Error::MacroblockAddressOutOfRange { address, count });
        }

        if increment > 1 && !first {
            self.skip_macroblocks(self.address + 1, address)?;
        }
        self.address = address;
        let address = address as usize;

        let mb_type = read_macroblock_type(self.reader, self.picture_type)?;
        let intra = mb_type.is_intra();
        if !intra {
            self.dc.reset();
        }
        if mb_type.has_quant() {
            self.quantizer_scale = self.reader.read_bits(5)? as i32;
        }
        if mb_type.has_forward() {
            let (code_x, r_x) = read_motion_axis(self.reader, self.forward_code)?;
            let (code_y, r_y) = read_motion_axis(self.reader, self.forward_code)?;
            self.forward.calculate(code_x, r_x, code_y, r_y);
        }
        if mb_type.has_backward() {
            let (code_x, r_x) = read_motion_axis(self.reader, self.backward_code)?;
            let (code_y, r_y) = read_motion_axis(self.reader, self.backward_code)?;
            self.backward.calculate(code_x, r_x, code_y, r_y);
        }

        match self.picture_type {
            PictureType::Predictive if mb_type.has_forward() => {
                let reference = self.reference(self.forward_ref)?;
                self.current
                    .compensate(reference, address, self.forward.luma(), self.forward.chroma())?;
            }
            PictureType::Predictive if !intra => {
                let reference = self.reference(self.forward_ref)?;
                self.current.copy_macroblock(reference, address)?;
            }
            PictureType::Bidirectional => self.predict_bidirectional(mb_type, address)?,
            _ => {}
        }

        // Predictor resets come after compensation.
        if self.picture_type == PictureType::Predictive && !mb_type.has_forward() {
            self.forward.reset();
        }
        if self.picture_type == PictureType::Bidirectional && intra {
            self.forward.reset();
            self.backward.reset();
        }

        let pattern = if mb_type.has_pattern() {
            read_coded_block_pattern(self.reader)?
        } else if intra {
            0x3F
        } else {
            0
        };

        if intra {
            self.dc.begin_macroblock(self.address);
        }
        for index in 0..6 {
            if pattern & (1 << (5 - index)) == 0 {
                continue;
            }
            self.decode_block(index, intra)?;
            if intra {
                self.current.set_block(address, index, &self.block)?;
            } else {
                self.current.correct_block(address, index, &self.block)?;
            }
        }
        if intra {
            self.dc.end_macroblock(self.address);
        }

        if self.picture_type == PictureType::DcIntra {
            // end_of_macroblock
            self.reader.skip_bits(1)?;
        }
        self.last_type = mb_type;
        Ok(())
    }

    /// Reconstruct the macroblocks from `start` up to, not including, `end`
    /// that the address increment skipped.
    fn skip_macroblocks(&mut self, start: i64, end: i64) -> Result<()> {
        self.dc.reset();
        match self.picture_type {
            PictureType::Predictive => {
                self.forward.reset();
                let reference = self.reference(self.forward_ref)?;
                for address in start..end {
                    self.current.copy_macroblock(reference, address as usize)?;
                }
            }
            PictureType::Bidirectional => {
                if self.last_type.is_intra() {
                    return Err(Mpeg1Error::SkipAfterIntra);
                }
                for address in start..end {
                    self.predict_bidirectional(self.last_type, address as usize)?;
                }
            }
            // Every macroblock of an I or D picture is coded; the skipped
            // area keeps whatever the buffer held.
            PictureType::Intra | PictureType::DcIntra => {}
        }
        Ok(())
    }

    fn predict_bidirectional(&mut self, mb_type: MacroblockType, address: usize) -> Result<()> {
        match (mb_type.has_forward(), mb_type.has_backward()) {
            (true, false) => {
                let reference = self.reference(self.forward_ref)?;
                self.current
                    .compensate(reference, address, self.forward.luma(), self.forward.chroma())
            }
            (false, true) => {
                let reference = self.reference(self.backward_ref)?;
                self.current
                    .compensate(reference, address, self.backward.luma(), self.backward.chroma())
            }
            (true, true) => {
                let forward_ref = self.reference(self.forward_ref)?;
                let backward_ref = self.reference(self.backward_ref)?;
                self.current.interpolate(
                    address,
                    (forward_ref, self.forward.luma(), self.forward.chroma()),
                    (backward_ref, self.backward.luma(), self.backward.chroma()),
                )
            }
            (false, false) => Ok(()),
        }
    }

    /// Decode block `index` into `self.block` as spatial samples (intra) or
    /// residuals (non-intra).
    fn decode_block(&mut self, index: usize, intra: bool) -> Result<()> {
        self.coefficients = [0; 64];
        let component = Component::of_block(index);
        let mut position;
        let mut differential = 0;

        if intra {
            let size = match component {
                Component::Luma => read_dc_size_luma(self.reader)?,
                Component::Cb | Component::Cr => read_dc_size_chroma(self.reader)?,
            };
            differential = read_dc_differential(self.reader, size)?;
            position = 0;
        } else {
            let first = read_dct_coefficient(self.reader, true)?;
            position = first.run as usize;
            if position > 63 {
                return Err(Mpeg1Error::CoefficientOverrun);
            }
            self.coefficients[position] = first.level;
        }

        if self.picture_type != PictureType::DcIntra {
            while !is_end_of_block(self.reader)? {
                let next = read_dct_coefficient(self.reader, false)?;
                position += next.run as usize + 1;
                if position > 63 {
                    return Err(Mpeg1Error::CoefficientOverrun);
                }
                self.coefficients[position] = next.level;
            }
            skip_end_of_block(self.reader)?;
        }

        if intra {
            let dc = self.dc.reconstruct(component, differential);
            dequantize_intra(
                &self.coefficients,
                self.quantizer_scale,
                &self.sequence.intra_quantizer_matrix,
                dc,
                &mut self.block,
            );
        } else {
            dequantize_non_intra(
                &self.coefficients,
                self.quantizer_scale,
                &self.sequence.non_intra_quantizer_matrix,
                &mut self.block,
            );
        }
        idct8x8(&mut self.block);
        Ok(())
    }
}

/// Read one motion vector component: the VLC code and, for `f > 1` and a
/// nonzero code, the residual.
fn read_motion_axis<R: Read>(reader: &mut BitReader<R>, code: Option<MotionCode>) -> Result<(i32, i32)> {
    let motion_code = read_motion_code(reader)?;
    let residual = match code {
        Some(code) if code.f() != 1 && motion_code != 0 => reader.read_bits(code.r_size())? as i32,
        _ => 0,
    };
    Ok((motion_code, residual))
}
