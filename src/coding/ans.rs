//! rANS range coder.
//!
//! The state is a `u32` kept in `[2^16, 2^32)`. Encoding maps
//! `x -> (x / freq) * 4096 + x % freq + cumulative`; decoding inverts it from
//! the low 12 bits of the state. Renormalization moves 16-bit chunks, and a
//! single chunk per symbol is always enough since frequencies are at most
//! [`ANS_TAB_SIZE`].
//!
//! rANS is last-in first-out: the encoder consumes symbols in reverse and
//! the symbol writer reorders the emitted chunks, see
//! [`SymbolWriter::finish`](super::SymbolWriter::finish).

use super::bit_reader::BitRead;
use super::distribution::{Distribution, SymbolInfo, ANS_LOG_TAB_SIZE, ANS_TAB_SIZE};
use crate::error::{Error, Result};

/// Marker folded into the initial encoder state.
pub const ANS_SIGNATURE: u32 = 0x13;

/// Encoder start state, and the state a decoder must end in.
pub const ANS_INITIAL_STATE: u32 = ANS_SIGNATURE << 16;

/// Lower bound of the normalized state interval.
pub const ANS_LOWER_BOUND: u32 = 1 << 16;

/// Bits moved per renormalization step.
pub const RENORM_BITS: u32 = 16;

/// rANS encoder state.
#[derive(Debug, Clone)]
pub struct AnsEncoder {
    state: u32,
}

impl AnsEncoder {
    /// Create an encoder in the initial state.
    pub fn new() -> Self {
        Self {
            state: ANS_INITIAL_STATE,
        }
    }

    /// Encode one symbol.
    ///
    /// Returns the 16-bit chunk shifted out by renormalization, if any.
    #[inline]
    pub fn put_symbol(&mut self, info: SymbolInfo) -> Option<u32> {
        debug_assert!(info.freq > 0 && info.freq <= ANS_TAB_SIZE);
        let mut chunk = None;
        if (self.state >> (32 - ANS_LOG_TAB_SIZE)) >= info.freq {
            chunk = Some(self.state & 0xFFFF);
            self.state >>= RENORM_BITS;
        }
        self.state = ((self.state / info.freq) << ANS_LOG_TAB_SIZE)
            + (self.state % info.freq)
            + info.cumulative;
        chunk
    }

    /// Look up `symbol` in `distribution` and encode it.
    #[inline]
    pub fn encode_symbol(&mut self, distribution: &Distribution, symbol: u32) -> Result<Option<u32>> {
        let info = distribution.encode_info(symbol)?;
        Ok(self.put_symbol(info))
    }

    /// Current state; written at the head of the stream once all symbols
    /// are encoded.
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl Default for AnsEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// rANS decoder state.
#[derive(Debug, Clone)]
pub struct AnsDecoder {
    state: u32,
}

impl AnsDecoder {
    /// Initialize the decoder from the 32-bit state at the head of the stream.
    pub fn new(reader: &mut impl BitRead) -> Result<Self> {
        let state = reader.read_bits(32)?;
        if state < ANS_LOWER_BOUND {
            return Err(Error::StreamDesync(format!(
                "initial state {state:#x} below {ANS_LOWER_BOUND:#x}"
            )));
        }
        Ok(Self { state })
    }

    /// Decode one symbol and renormalize.
    #[inline]
    pub fn read_symbol(
        &mut self,
        distribution: &Distribution,
        reader: &mut impl BitRead,
    ) -> Result<u32> {
        let slot = self.state & (ANS_TAB_SIZE - 1);
        let info = distribution.lookup(slot);
        self.state = info.freq * (self.state >> ANS_LOG_TAB_SIZE) + slot - info.cumulative;
        if self.state < ANS_LOWER_BOUND {
            self.state = (self.state << RENORM_BITS) | reader.read_bits(RENORM_BITS)?;
        }
        Ok(info.symbol)
    }

    /// Current state.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Check that decoding ended where encoding started.
    pub fn check_final_state(&self) -> Result<()> {
        if self.state == ANS_INITIAL_STATE {
            Ok(())
        } else {
            Err(Error::StreamDesync(format!(
                "final state {:#x}, expected {ANS_INITIAL_STATE:#x}",
                self.state
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::{BitReader, BitWriter};

    /// Encode symbols alone (no raw bits) into a stream.
    fn encode(distribution: &Distribution, symbols: &[u32]) -> (Vec<u8>, u64) {
        let mut encoder = AnsEncoder::new();
        let mut chunks = Vec::new();
        for &symbol in symbols.iter().rev() {
            chunks.push(encoder.encode_symbol(distribution, symbol).unwrap());
        }
        let mut writer = BitWriter::new();
        writer.write(32, encoder.state());
        for chunk in chunks.into_iter().rev().flatten() {
            writer.write(RENORM_BITS, chunk);
        }
        let bit_len = writer.bit_len();
        (writer.finish(), bit_len)
    }

    fn decode(distribution: &Distribution, data: &[u8], count: usize) -> Result<Vec<u32>> {
        let mut reader = BitReader::new(data);
        let mut decoder = AnsDecoder::new(&mut reader)?;
        let symbols = (0..count)
            .map(|_| decoder.read_symbol(distribution, &mut reader))
            .collect::<Result<Vec<_>>>()?;
        decoder.check_final_state()?;
        Ok(symbols)
    }

    #[test]
    fn test_empty_stream_is_initial_state() {
        let dist = Distribution::flat(4).unwrap();
        let (data, bit_len) = encode(&dist, &[]);
        assert_eq!(bit_len, 32);
        assert_eq!(data, ANS_INITIAL_STATE.to_le_bytes().to_vec());
        assert_eq!(decode(&dist, &data, 0).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_roundtrip_skewed() {
        let dist = Distribution::from_frequencies(&[3000, 1000, 95, 1]).unwrap();
        let symbols: Vec<u32> = (0..5000u32).map(|i| [0, 0, 1, 0, 2, 0, 1, 3][i as usize % 8]).collect();
        let (data, _) = encode(&dist, &symbols);
        assert_eq!(decode(&dist, &data, symbols.len()).unwrap(), symbols);
    }

    #[test]
    fn test_single_symbol_costs_nothing() {
        let dist = Distribution::from_frequencies(&[4096]).unwrap();
        let (data, bit_len) = encode(&dist, &[0; 1000]);
        assert_eq!(bit_len, 32);
        assert_eq!(decode(&dist, &data, 1000).unwrap(), vec![0; 1000]);
    }

    #[test]
    fn test_state_stays_normalized() {
        let dist = Distribution::from_frequencies(&[1, 4095]).unwrap();
        let mut encoder = AnsEncoder::new();
        for i in 0..10_000u32 {
            encoder.encode_symbol(&dist, u32::from(i % 3 == 0)).unwrap();
            assert!(encoder.state() >= ANS_LOWER_BOUND);
        }
    }

    #[test]
    fn test_wrong_count_desyncs() {
        let dist = Distribution::from_frequencies(&[2048, 1024, 1024]).unwrap();
        let (data, _) = encode(&dist, &[0, 1, 2, 1, 0]);
        assert!(decode(&dist, &data, 5).is_ok());
        assert!(decode(&dist, &data, 4).is_err());
    }

    #[test]
    fn test_rejects_small_initial_state() {
        let data = 0x0000_FFFFu32.to_le_bytes();
        let mut reader = BitReader::new(&data);
        assert!(matches!(
            AnsDecoder::new(&mut reader),
            Err(Error::StreamDesync(_))
        ));
    }

    #[test]
    fn test_encode_zero_frequency_fails() {
        let dist = Distribution::from_frequencies(&[4096, 0]).unwrap();
        let mut encoder = AnsEncoder::new();
        assert!(matches!(
            encoder.encode_symbol(&dist, 1),
            Err(Error::Table(_))
        ));
    }
}
