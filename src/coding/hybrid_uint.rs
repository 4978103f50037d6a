//! Hybrid integer binarization.
//!
//! Splits an unsigned value into a context-coded token and a run of raw bits.
//! Values below `2^split_exponent` are their own token. Larger values put
//! their exponent, the `msb_in_token` bits after the leading one and the
//! `lsb_in_token` lowest bits into the token; the middle bits go to the
//! stream uncoded.
//!
//! ```text
//!  value = 1 mmm ........ lll
//!            ^^^ msb      ^^^ lsb     -> token (with the exponent)
//!                ^^^^^^^^            -> raw bits
//! ```

use super::bit_reader::BitRead;
use super::bit_writer::BitWriter;
use super::ceil_log2;
use crate::error::{Error, Result};

/// Largest allowed `split_exponent`.
pub const MAX_SPLIT_EXPONENT: u32 = 32;

/// Parameters of the hybrid uint binarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HybridUintConfig {
    split_exponent: u32,
    msb_in_token: u32,
    lsb_in_token: u32,
    /// `2^split_exponent`, first token that carries raw bits
    split_token: u64,
}

/// One binarized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HybridToken {
    /// Symbol passed to the range coder.
    pub token: u32,
    /// Number of raw bits following the token.
    pub nbits: u32,
    /// The raw bits, right aligned.
    pub bits: u32,
}

impl HybridUintConfig {
    /// Build a configuration.
    ///
    /// Fails with [`Error::Config`] unless
    /// `msb_in_token + lsb_in_token <= split_exponent <= 32`.
    pub fn new(split_exponent: u32, msb_in_token: u32, lsb_in_token: u32) -> Result<Self> {
        let valid = split_exponent <= MAX_SPLIT_EXPONENT
            && msb_in_token
                .checked_add(lsb_in_token)
                .is_some_and(|folded| folded <= split_exponent);
        if !valid {
            return Err(Error::Config {
                split_exponent,
                msb_in_token,
                lsb_in_token,
            });
        }
        Ok(Self::from_parts(split_exponent, msb_in_token, lsb_in_token))
    }

    /// Assemble a configuration whose parameters are already known valid.
    const fn from_parts(split_exponent: u32, msb_in_token: u32, lsb_in_token: u32) -> Self {
        Self {
            split_exponent,
            msb_in_token,
            lsb_in_token,
            split_token: 1u64 << split_exponent,
        }
    }

    /// Exponent below which values are coded directly.
    pub fn split_exponent(&self) -> u32 {
        self.split_exponent
    }

    /// Bits after the leading one that are folded into the token.
    pub fn msb_in_token(&self) -> u32 {
        self.msb_in_token
    }

    /// Lowest bits that are folded into the token.
    pub fn lsb_in_token(&self) -> u32 {
        self.lsb_in_token
    }

    /// `{0, 0, 0}`: every value is its own token.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.split_exponent == 0
    }

    #[inline]
    fn is_direct(&self, token_or_value: u32) -> bool {
        self.is_identity() || u64::from(token_or_value) < self.split_token
    }

    /// Binarize `value`.
    #[inline]
    pub fn encode(&self, value: u32) -> HybridToken {
        if self.is_direct(value) {
            return HybridToken {
                token: value,
                nbits: 0,
                bits: 0,
            };
        }
        let msb = self.msb_in_token;
        let lsb = self.lsb_in_token;
        // value >= split_token >= 2, so the exponent is well defined
        let e = 31 - value.leading_zeros();
        let m = value - (1u32 << e);
        let token = self.split_token
            + (u64::from(e - self.split_exponent) << (msb + lsb))
            + (u64::from(m >> (e - msb)) << lsb)
            + u64::from(m & ((1u32 << lsb) - 1));
        let nbits = e - msb - lsb;
        HybridToken {
            token: token as u32,
            nbits,
            bits: ((u64::from(value) >> lsb) & ((1u64 << nbits) - 1)) as u32,
        }
    }

    /// Number of raw bits that follow `token` in the stream.
    ///
    /// Fails with [`Error::StreamDesync`] when the token implies a value
    /// wider than 32 bits.
    #[inline]
    pub fn raw_bit_count(&self, token: u32) -> Result<u32> {
        if self.is_direct(token) {
            return Ok(0);
        }
        let folded = self.msb_in_token + self.lsb_in_token;
        let bucket = (u64::from(token) - self.split_token) >> folded;
        let e = u64::from(self.split_exponent) + bucket;
        if e > 31 {
            return Err(Error::StreamDesync(format!(
                "token {token} implies a {}-bit value",
                e + 1
            )));
        }
        Ok(e as u32 - folded)
    }

    /// Rebuild a value from its token and raw bits.
    #[inline]
    pub fn decode(&self, token: u32, bits: u32) -> Result<u32> {
        if self.is_direct(token) {
            return Ok(token);
        }
        let nbits = self.raw_bit_count(token)?;
        let msb = self.msb_in_token;
        let lsb = self.lsb_in_token;
        let low = u64::from(token & ((1u32 << lsb) - 1));
        let high = u64::from(token >> lsb) & ((1u64 << msb) - 1);
        let bits = u64::from(bits) & ((1u64 << nbits) - 1);
        let value = (((((1u64 << msb) | high) << nbits) | bits) << lsb) | low;
        Ok(value as u32)
    }

    /// Serialize the configuration.
    pub fn write(&self, writer: &mut BitWriter) {
        writer.write(6, self.split_exponent);
        writer.write(ceil_log2(self.split_exponent + 1), self.msb_in_token);
        writer.write(
            ceil_log2(self.split_exponent - self.msb_in_token + 1),
            self.lsb_in_token,
        );
    }

    /// Read a configuration written by [`HybridUintConfig::write`].
    pub fn read(reader: &mut impl BitRead) -> Result<Self> {
        let split_exponent = reader.read_bits(6)?;
        if split_exponent > MAX_SPLIT_EXPONENT {
            return Err(Error::StreamDesync(format!(
                "split exponent {split_exponent} out of range"
            )));
        }
        let msb_in_token = reader.read_bits(ceil_log2(split_exponent + 1))?;
        if msb_in_token > split_exponent {
            return Err(Error::StreamDesync(format!(
                "msb_in_token {msb_in_token} exceeds split exponent {split_exponent}"
            )));
        }
        let lsb_in_token = reader.read_bits(ceil_log2(split_exponent - msb_in_token + 1))?;
        if lsb_in_token > split_exponent - msb_in_token {
            return Err(Error::StreamDesync(format!(
                "lsb_in_token {lsb_in_token} exceeds the {} bits left by msb_in_token {msb_in_token}",
                split_exponent - msb_in_token
            )));
        }
        Self::new(split_exponent, msb_in_token, lsb_in_token)
    }
}

impl Default for HybridUintConfig {
    fn default() -> Self {
        Self::from_parts(4, 2, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::BitReader;

    fn make(split: u32, msb: u32, lsb: u32) -> HybridUintConfig {
        HybridUintConfig::new(split, msb, lsb).unwrap()
    }

    #[test]
    fn test_rejects_invalid_configs() {
        assert!(HybridUintConfig::new(4, 3, 2).is_err());
        assert!(HybridUintConfig::new(33, 0, 0).is_err());
        assert!(HybridUintConfig::new(0, 1, 0).is_err());
        assert!(HybridUintConfig::new(u32::MAX, u32::MAX, 2).is_err());
        assert!(HybridUintConfig::new(32, 16, 16).is_ok());
    }

    #[test]
    fn test_small_values_are_tokens() {
        let config = make(4, 2, 0);
        for v in 0..16 {
            assert_eq!(
                config.encode(v),
                HybridToken {
                    token: v,
                    nbits: 0,
                    bits: 0
                }
            );
        }
    }

    #[test]
    fn test_known_binarization() {
        let config = make(4, 2, 0);
        // 0b1011_0110: e = 7, msb bits 01, raw bits 1_0110
        assert_eq!(
            config.encode(0b1011_0110),
            HybridToken {
                token: 16 + (3 << 2) + 0b01,
                nbits: 5,
                bits: 0b1_0110
            }
        );

        let config = make(4, 1, 1);
        // 0b1_1010_0101: e = 8, msb bit 1, lsb bit 1, raw bits 010_010
        assert_eq!(
            config.encode(0b1_1010_0101),
            HybridToken {
                token: 16 + (4 << 2) + (1 << 1) + 1,
                nbits: 6,
                bits: 0b01_0010
            }
        );
    }

    #[test]
    fn test_identity_config() {
        let config = make(0, 0, 0);
        for v in [0, 1, 2, 255, 256, 1 << 20, u32::MAX] {
            let token = config.encode(v);
            assert_eq!(token, HybridToken { token: v, nbits: 0, bits: 0 });
            assert_eq!(config.decode(token.token, 0).unwrap(), v);
        }
    }

    #[test]
    fn test_roundtrip_exhaustive_small() {
        for (split, msb, lsb) in [(1, 0, 0), (4, 1, 1), (4, 2, 0), (4, 2, 1), (8, 0, 8), (32, 0, 0)] {
            let config = make(split, msb, lsb);
            for v in (0..70_000).chain([u32::MAX, u32::MAX - 1, 1 << 31]) {
                let t = config.encode(v);
                assert_eq!(config.raw_bit_count(t.token).unwrap(), t.nbits);
                assert_eq!(config.decode(t.token, t.bits).unwrap(), v, "{config:?} {v}");
            }
        }
    }

    #[test]
    fn test_oversized_token_desyncs() {
        let config = make(4, 2, 0);
        let max = config.encode(u32::MAX).token;
        assert!(config.raw_bit_count(max).is_ok());
        assert!(matches!(
            config.raw_bit_count(max + 1),
            Err(Error::StreamDesync(_))
        ));
        assert!(config.decode(max + 1, 0).is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let configs = [make(0, 0, 0), make(4, 2, 0), make(4, 1, 1), make(32, 7, 25)];
        let mut writer = BitWriter::new();
        for c in &configs {
            c.write(&mut writer);
        }
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        for c in &configs {
            assert_eq!(HybridUintConfig::read(&mut reader).unwrap(), *c);
        }
    }

    #[test]
    fn test_default_matches_validated_config() {
        let config = HybridUintConfig::default();
        assert_eq!(config, make(4, 2, 0));
        assert_eq!(config.encode(16).token, 16);
        assert_eq!(config.encode(15).token, 15);
    }

    #[test]
    fn test_read_rejects_oversized_lsb() {
        // split 4, msb 2 leaves 2 bits, but the 2-bit lsb field holds 3
        let mut writer = BitWriter::new();
        writer.write(6, 4);
        writer.write(3, 2);
        writer.write(2, 3);
        let bytes = writer.finish();
        let err = HybridUintConfig::read(&mut BitReader::new(&bytes)).unwrap_err();
        assert!(matches!(err, Error::StreamDesync(_)), "{err}");
    }
}
