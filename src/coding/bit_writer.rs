//! Bit writer, the mirror of [`BitReader`](super::BitReader).
//!
//! Writes LSB first; the last byte is zero padded.

/// Bit writer that appends to a byte vector.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    data: Vec<u8>,
    /// Pending bits, oldest in bit 0
    buffer: u64,
    bits_in_buffer: u32,
}

impl BitWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty writer with room for `bytes` bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Append the low `nbits` bits of `bits` (`nbits <= 32`).
    #[inline]
    pub fn write(&mut self, nbits: u32, bits: u32) {
        debug_assert!(nbits <= 32);
        if nbits == 0 {
            return;
        }
        let bits = u64::from(bits) & ((1u64 << nbits) - 1);
        self.buffer |= bits << self.bits_in_buffer;
        self.bits_in_buffer += nbits;
        while self.bits_in_buffer >= 8 {
            self.data.push(self.buffer as u8);
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn zero_pad_to_byte(&mut self) {
        if self.bits_in_buffer > 0 {
            self.data.push(self.buffer as u8);
            self.buffer = 0;
            self.bits_in_buffer = 0;
        }
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> u64 {
        self.data.len() as u64 * 8 + u64::from(self.bits_in_buffer)
    }

    /// Pad to a byte boundary and return the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.zero_pad_to_byte();
        self.data
    }
}
