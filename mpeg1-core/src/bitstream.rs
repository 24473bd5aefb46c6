//! Bitstream reading and writing utilities.
//!
//! [`BitReader`] pulls bytes from any blocking [`Read`] source on demand and
//! exposes MSB-first bit access on top of them. Unread bytes are slid to the
//! front of the internal buffer before each refill, so the reader never seeks
//! and never holds more than one buffer of the stream in memory.
//!
//! [`BitWriter`] is the inverse and is used to synthesize streams.

use std::io::{ErrorKind, Read};

use crate::error::{BitstreamError, Result};

/// Default refill buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Smallest buffer that can always satisfy a 32-bit access at any bit offset.
const MIN_BUFFER_SIZE: usize = 8;

/// Maximum number of bits a single peek or read may request.
pub const MAX_ACCESS_BITS: u32 = 32;

/// A refillable bitstream reader over a blocking byte source.
#[derive(Debug)]
pub struct BitReader<R> {
    source: R,
    buffer: Box<[u8]>,
    /// Number of valid bytes in `buffer`.
    len: usize,
    /// Read cursor in bits, relative to the start of `buffer`.
    bit_pos: usize,
    /// Bytes dropped from the front of the buffer by earlier refills.
    discarded: u64,
    exhausted: bool,
}

impl<R: Read> BitReader<R> {
    /// Create a new bit reader with the default buffer size.
    pub fn new(source: R) -> Self {
        Self::with_capacity(source, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new bit reader with a specific buffer size in bytes.
    pub fn with_capacity(source: R, capacity: usize) -> Self {
        Self {
            source,
            buffer: vec![0u8; capacity.max(MIN_BUFFER_SIZE)].into_boxed_slice(),
            len: 0,
            bit_pos: 0,
            discarded: 0,
            exhausted: false,
        }
    }

    /// Get the number of bits consumed since the start of the stream.
    pub fn position(&self) -> u64 {
        self.discarded * 8 + self.bit_pos as u64
    }

    /// Check if the cursor sits on a byte boundary.
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Skip to the next byte boundary.
    ///
    /// The skipped bits always belong to a byte that is already buffered.
    pub fn align_to_byte(&mut self) {
        self.bit_pos = (self.bit_pos + 7) & !7;
    }

    /// Check whether the source is drained and every buffered bit consumed.
    pub fn is_eof(&mut self) -> Result<bool> {
        Ok(!self.ensure(1)?)
    }

    /// Peek at the next `n` bits (0-32) without consuming them.
    pub fn peek_bits(&mut self, n: u32) -> Result<u32> {
        self.try_peek_bits(n)?
            .ok_or_else(|| BitstreamError::UnexpectedEnd.into())
    }

    /// Peek at the next `n` bits, returning `None` if the stream ends first.
    pub fn try_peek_bits(&mut self, n: u32) -> Result<Option<u32>> {
        check_width(n)?;
        if n == 0 {
            return Ok(Some(0));
        }
        if !self.ensure(n)? {
            return Ok(None);
        }
        Ok(Some(self.extract(n)))
    }

    /// Read `n` bits (0-32) as an unsigned integer.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        let value = self.peek_bits(n)?;
        self.bit_pos += n as usize;
        Ok(value)
    }

    /// Read `n` bits and sign-extend from bit `n - 1`.
    pub fn read_signed(&mut self, n: u32) -> Result<i32> {
        let value = self.read_bits(n)?;
        Ok(sign_extend(value, n))
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Skip `n` bits.
    pub fn skip_bits(&mut self, mut n: u64) -> Result<()> {
        while n > 0 {
            let step = n.min(u64::from(MAX_ACCESS_BITS)) as u32;
            if !self.ensure(step)? {
                return Err(BitstreamError::UnexpectedEnd.into());
            }
            self.bit_pos += step as usize;
            n -= u64::from(step);
        }
        Ok(())
    }

    /// Get a reference to the underlying byte source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Consume the reader and return the byte source.
    ///
    /// Any buffered but unread bytes are lost.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn buffered_bits(&self) -> usize {
        self.len * 8 - self.bit_pos
    }

    /// Make sure at least `n` bits are buffered. Returns `false` at end of stream.
    fn ensure(&mut self, n: u32) -> Result<bool> {
        while self.buffered_bits() < n as usize {
            if self.exhausted {
                return Ok(false);
            }
            self.refill()?;
        }
        Ok(true)
    }

    fn refill(&mut self) -> Result<()> {
        let consumed = self.bit_pos / 8;
        if consumed > 0 {
            self.buffer.copy_within(consumed..self.len, 0);
            self.len -= consumed;
            self.bit_pos -= consumed * 8;
            self.discarded += consumed as u64;
        }

        while self.len < self.buffer.len() {
            match self.source.read(&mut self.buffer[self.len..]) {
                Ok(0) => {
                    self.exhausted = true;
                    break;
                }
                Ok(n) => {
                    self.len += n;
                    break;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn extract(&self, n: u32) -> u32 {
        let byte = self.bit_pos / 8;
        let mut word = 0u64;
        for i in 0..8 {
            let next = self.buffer.get(byte + i).copied().unwrap_or(0);
            word = (word << 8) | u64::from(next);
        }
        ((word << (self.bit_pos % 8)) >> (64 - n)) as u32
    }
}

fn check_width(n: u32) -> Result<()> {
    if n > MAX_ACCESS_BITS {
        return Err(BitstreamError::InvalidBitCount { requested: n }.into());
    }
    Ok(())
}

/// Sign-extend the low `n` bits of `value`.
pub fn sign_extend(value: u32, n: u32) -> i32 {
    if n == 0 {
        return 0;
    }
    let shift = 32 - n;
    ((value << shift) as i32) >> shift
}

/// A bitstream writer for synthesizing coded data.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    bit_pos: u8,
}

impl BitWriter {
    /// Create a new bit writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new bit writer with capacity.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            bit_pos: 0,
        }
    }

    /// Get the current bit position.
    pub fn position(&self) -> usize {
        self.data.len() * 8 - (8 - self.bit_pos as usize) % 8
    }

    /// Check if the writer is byte-aligned.
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, bit: bool) {
        if self.bit_pos == 0 {
            self.data.push(0);
        }
        if bit {
            if let Some(last) = self.data.last_mut() {
                *last |= 1 << (7 - self.bit_pos);
            }
        }
        self.bit_pos = (self.bit_pos + 1) % 8;
    }

    /// Write the low `n` bits (0-32) of `value`, MSB first.
    pub fn write_bits(&mut self, value: u32, n: u32) -> Result<()> {
        check_width(n)?;
        if n < 32 && value >> n != 0 {
            return Err(BitstreamError::ValueOverflow { value, bits: n }.into());
        }
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1 != 0);
        }
        Ok(())
    }

    /// Write `value` as an `n`-bit two's complement field.
    pub fn write_signed(&mut self, value: i32, n: u32) -> Result<()> {
        check_width(n)?;
        let mask = if n == 32 { u32::MAX } else { (1u32 << n) - 1 };
        if sign_extend(value as u32 & mask, n) != value {
            return Err(BitstreamError::ValueOverflow {
                value: value as u32,
                bits: n,
            }
            .into());
        }
        self.write_bits(value as u32 & mask, n)
    }

    /// Write whole bytes. The writer does not need to be aligned.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            for i in (0..8).rev() {
                self.write_bit((byte >> i) & 1 != 0);
            }
        }
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        self.bit_pos = 0;
    }

    /// Align and emit a `0x000001xx` start code.
    pub fn write_start_code(&mut self, code: u8) {
        self.align_to_byte();
        self.data.extend_from_slice(&[0x00, 0x00, 0x01, code]);
    }

    /// Get the written data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the writer and return the data.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Find the offset of the next `0x000001` start code prefix in a byte slice.
pub fn find_start_code(data: &[u8]) -> Option<usize> {
    data.windows(3).position(|w| w == [0x00, 0x00, 0x01])
}
