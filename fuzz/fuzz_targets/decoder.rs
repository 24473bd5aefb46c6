#![no_main]

//! Fuzz target for the MPEG-1 video decoder.
//!
//! Feeds arbitrary bytes, optionally behind a valid sequence header so the
//! picture layers get exercised, and drains the output queue on another
//! thread.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mpeg1_core::bitstream::BitWriter;
use mpeg1_video::{probe_sequence_header, Mpeg1Decoder, Mpeg1DecoderConfig, NullRenderer};

#[derive(Arbitrary, Debug)]
struct DecoderInput {
    data: Vec<u8>,
    prefix: Option<HeaderPrefix>,
    queue_capacity: u8,
}

/// A well-formed sequence header and group start ahead of the fuzz data.
#[derive(Arbitrary, Debug)]
struct HeaderPrefix {
    width: u8,
    height: u8,
    closed_gop: bool,
}

impl HeaderPrefix {
    fn write(&self, w: &mut BitWriter) {
        w.write_start_code(0xB3);
        let _ = w.write_bits(u32::from(self.width.max(1)), 12);
        let _ = w.write_bits(u32::from(self.height.max(1)), 12);
        let _ = w.write_bits(1, 4);
        let _ = w.write_bits(3, 4);
        let _ = w.write_bits(0x3FFFF, 18);
        w.write_bit(true);
        let _ = w.write_bits(20, 10);
        let _ = w.write_bits(0, 3);
        w.write_start_code(0xB8);
        let _ = w.write_bits(1 << 12, 25);
        w.write_bit(self.closed_gop);
        w.write_bit(false);
    }
}

fuzz_target!(|input: DecoderInput| {
    if input.data.len() > 256 * 1024 {
        return;
    }

    let mut writer = BitWriter::new();
    if let Some(prefix) = &input.prefix {
        prefix.write(&mut writer);
        writer.align_to_byte();
    }
    writer.write_bytes(&input.data);
    let stream = writer.into_data();

    let _ = probe_sequence_header(&stream);

    let config = Mpeg1DecoderConfig::default()
        .with_queue_capacity(usize::from(input.queue_capacity % 4))
        .with_max_dimensions(1024, 1024);
    let (mut decoder, pictures) = Mpeg1Decoder::with_config(stream.as_slice(), NullRenderer, config);

    std::thread::scope(|scope| {
        scope.spawn(move || {
            for picture in pictures {
                assert!(picture.luma().width() >= picture.width() as usize);
                let mut sink = Vec::with_capacity(picture.i420_size());
                let _ = picture.write_i420(&mut sink);
                assert_eq!(sink.len(), picture.i420_size());
            }
        });
        let _ = decoder.decode();
        drop(decoder);
    });
});
