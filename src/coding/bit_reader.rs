//! Bit reader for entropy-coded streams.
//!
//! Reads bits from a byte slice, LSB first: the first bit of the stream is
//! bit 0 of byte 0, and a multi-bit field is assembled least significant bit
//! first.

use crate::error::{Error, Result};

/// Bit cursor consumed by the symbol reader.
///
/// `peek_bits` never fails: bits past the end of the stream read as zero.
/// Only `consume` enforces the end of the buffer.
pub trait BitRead {
    /// Return the next `n` bits (`n <= 32`) without advancing.
    fn peek_bits(&self, n: u32) -> u32;

    /// Advance the cursor by `n` bits.
    fn consume(&mut self, n: u32) -> Result<()>;

    /// Bits left before the declared end of the stream.
    fn remaining_bits(&self) -> u64;

    /// Read `n` bits (`n <= 32`) and advance.
    #[inline]
    fn read_bits(&mut self, n: u32) -> Result<u32> {
        let value = self.peek_bits(n);
        self.consume(n)?;
        Ok(value)
    }
}

/// Bit reader over a byte slice.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Valid bits in the last byte of `data` (0 means all 8)
    tail_bits: u32,
    /// Pending bits, next bit in bit 0
    buffer: u64,
    /// Bits available in buffer
    bits_in_buffer: u32,
    total_bits: u64,
    consumed: u64,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader over the whole slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_bit_len(data, data.len() as u64 * 8)
    }

    /// Create a bit reader that ends after exactly `bit_len` bits.
    ///
    /// `bit_len` is clamped to the size of `data`.
    pub fn with_bit_len(data: &'a [u8], bit_len: u64) -> Self {
        let bit_len = bit_len.min(data.len() as u64 * 8);
        let byte_len = bit_len.div_ceil(8) as usize;
        let mut reader = Self {
            data: &data[..byte_len],
            pos: 0,
            tail_bits: (bit_len % 8) as u32,
            buffer: 0,
            bits_in_buffer: 0,
            total_bits: bit_len,
            consumed: 0,
        };
        reader.fill_buffer();
        reader
    }

    /// Fill the buffer with more bytes.
    fn fill_buffer(&mut self) {
        while self.bits_in_buffer <= 56 && self.pos < self.data.len() {
            let mut byte = u64::from(self.data[self.pos]);
            if self.pos + 1 == self.data.len() && self.tail_bits != 0 {
                byte &= (1 << self.tail_bits) - 1;
            }
            self.buffer |= byte << self.bits_in_buffer;
            self.bits_in_buffer += 8;
            self.pos += 1;
        }
    }

    /// Get the current bit position.
    pub fn bit_position(&self) -> u64 {
        self.consumed
    }

    /// Check if at end of data.
    pub fn is_eof(&self) -> bool {
        self.consumed >= self.total_bits
    }

    /// Total number of readable bits.
    pub fn bit_len(&self) -> u64 {
        self.total_bits
    }
}

impl BitRead for BitReader<'_> {
    #[inline]
    fn peek_bits(&self, n: u32) -> u32 {
        debug_assert!(n <= 32);
        if n == 0 {
            return 0;
        }
        (self.buffer & ((1u64 << n) - 1)) as u32
    }

    #[inline]
    fn consume(&mut self, n: u32) -> Result<()> {
        debug_assert!(n <= 32);
        let available = self.remaining_bits();
        if u64::from(n) > available {
            return Err(Error::TruncatedInput {
                needed: u64::from(n),
                available,
            });
        }
        self.buffer >>= n;
        self.bits_in_buffer -= n;
        self.consumed += u64::from(n);
        self.fill_buffer();
        Ok(())
    }

    #[inline]
    fn remaining_bits(&self) -> u64 {
        self.total_bits - self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_lsb_first() {
        let data = [0b1011_0100, 0b1100_1010];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(4).unwrap(), 0b0100);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
        assert_eq!(reader.read_bits(8).unwrap(), 0b1100_1010);
    }

    #[test]
    fn test_read_across_bytes() {
        let data = [0xFF, 0x01, 0x00, 0x80, 0x7F];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(3).unwrap(), 0b111);
        assert_eq!(reader.read_bits(32).unwrap(), 0xF000_003F);
        assert_eq!(reader.remaining_bits(), 5);
    }

    #[test]
    fn test_peek_bits() {
        let data = [0b1011_0100];
        let reader = BitReader::new(&data);

        assert_eq!(reader.peek_bits(4), 0b0100);
        assert_eq!(reader.peek_bits(8), 0b1011_0100);
        // Past the end reads as zero.
        assert_eq!(reader.peek_bits(16), 0b1011_0100);
    }

    #[test]
    fn test_eof() {
        let data = [0xFF];
        let mut reader = BitReader::new(&data);

        assert!(!reader.is_eof());
        reader.read_bits(8).unwrap();
        assert!(reader.is_eof());
        assert_eq!(
            reader.read_bits(1),
            Err(Error::TruncatedInput {
                needed: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_bit_len_masks_tail() {
        let data = [0xFF, 0xFF];
        let mut reader = BitReader::with_bit_len(&data, 11);

        assert_eq!(reader.peek_bits(16), 0x07FF);
        assert_eq!(reader.read_bits(11).unwrap(), 0x07FF);
        assert!(reader.consume(1).is_err());
    }

    #[test]
    fn test_zero_width_read() {
        let mut reader = BitReader::new(&[]);
        assert_eq!(reader.read_bits(0).unwrap(), 0);
        assert!(reader.is_eof());
    }
}
