#![no_main]

//! Fuzz target for BitReader edge cases.
//!
//! Drives the refillable reader with arbitrary operation sequences over tiny
//! buffers, and checks that whatever the writer produces reads back intact.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mpeg1_core::bitstream::{BitReader, BitWriter};

#[derive(Arbitrary, Debug)]
struct BitstreamInput {
    data: Vec<u8>,
    buffer_size: u8,
    operations: Vec<BitOperation>,
    writer_operations: Vec<WriteOperation>,
    test_mode: TestMode,
}

#[derive(Arbitrary, Debug, Clone)]
enum TestMode {
    /// Test BitReader only
    Reader,
    /// Test roundtrip (write then read)
    Roundtrip,
}

#[derive(Arbitrary, Debug, Clone)]
enum BitOperation {
    /// Read a single bit
    ReadBit,
    /// Read n bits (0-32)
    ReadBits(u8),
    /// Read n bits sign-extended
    ReadSigned(u8),
    /// Skip n bits
    Skip(u16),
    /// Peek at n bits
    PeekBits(u8),
    /// Peek without failing at end of data
    TryPeekBits(u8),
    /// Align to byte boundary
    AlignToByte,
    /// Check if at EOF
    CheckEof,
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum WriteOperation {
    WriteBit(bool),
    WriteBits { value: u32, n: u8 },
    WriteStartCode(u8),
    AlignToByte,
}

fuzz_target!(|input: BitstreamInput| {
    // Limit operations to prevent DoS
    if input.operations.len() > 10000 || input.writer_operations.len() > 10000 {
        return;
    }
    let capacity = usize::from(input.buffer_size).max(4);

    match input.test_mode {
        TestMode::Reader => {
            let mut reader = BitReader::with_capacity(input.data.as_slice(), capacity);
            let total_bits = input.data.len() as u64 * 8;

            for op in input.operations.iter().take(1000) {
                let result = match op {
                    BitOperation::ReadBit => reader.read_bit().map(|_| ()),
                    BitOperation::ReadBits(n) => reader.read_bits(u32::from(*n % 33)).map(|_| ()),
                    BitOperation::ReadSigned(n) => {
                        reader.read_signed(u32::from(*n % 32) + 1).map(|_| ())
                    }
                    BitOperation::Skip(n) => reader.skip_bits(u64::from(*n)),
                    BitOperation::PeekBits(n) => reader.peek_bits(u32::from(*n % 33)).map(|_| ()),
                    BitOperation::TryPeekBits(n) => {
                        reader.try_peek_bits(u32::from(*n % 33)).map(|_| ())
                    }
                    BitOperation::AlignToByte => {
                        reader.align_to_byte();
                        Ok(())
                    }
                    BitOperation::CheckEof => reader.is_eof().map(|_| ()),
                };

                // Failed reads never move the reader past the data.
                assert!(reader.position() <= total_bits);
                if result.is_err() {
                    break;
                }
            }
        }
        TestMode::Roundtrip => {
            let mut writer = BitWriter::new();
            let mut fields = Vec::new();

            for op in input.writer_operations.iter().take(1000) {
                match *op {
                    WriteOperation::WriteBit(bit) => {
                        writer.write_bit(bit);
                        fields.push((u32::from(bit), 1));
                    }
                    WriteOperation::WriteBits { value, n } => {
                        let n = u32::from(n % 32) + 1;
                        let value = if n == 32 { value } else { value & ((1 << n) - 1) };
                        if writer.write_bits(value, n).is_ok() {
                            fields.push((value, n));
                        }
                    }
                    // Padding breaks the field sequence; only exercise it.
                    WriteOperation::WriteStartCode(_) | WriteOperation::AlignToByte => {}
                }

                if writer.data().len() > 64 * 1024 {
                    break;
                }
            }
            writer.align_to_byte();

            let data = writer.into_data();
            let mut reader = BitReader::with_capacity(data.as_slice(), capacity);
            for (value, n) in fields {
                assert_eq!(reader.read_bits(n).ok(), Some(value));
            }

            let mut codes = BitWriter::new();
            for op in input.writer_operations.iter().take(64) {
                match *op {
                    WriteOperation::WriteStartCode(id) => codes.write_start_code(id),
                    WriteOperation::AlignToByte => codes.align_to_byte(),
                    WriteOperation::WriteBit(bit) => codes.write_bit(bit),
                    WriteOperation::WriteBits { .. } => {}
                }
            }
            assert!(codes.data().len() < 64 * 5);
        }
    }
});
