//! Entropy coding primitives.
//!
//! This module implements the coding layer used for pixel residuals,
//! transform coefficients and auxiliary payloads: hybrid integer
//! binarization on top of an rANS coder with per-context distributions.
//!
//! ## Components
//!
//! | Type | Role |
//! |------|------|
//! | [`pack_signed`] / [`unpack_signed`] | Zigzag mapping of signed values |
//! | [`HybridUintConfig`] | Splits a value into token and raw bits |
//! | [`Distribution`] | Normalized per-context token frequencies |
//! | [`AnsEncoder`] / [`AnsDecoder`] | rANS state machines |
//! | [`EntropyCode`] | Context map and per-cluster code |
//! | [`SingleContext`] | One context over a borrowed distribution |
//! | [`SymbolWriter`] / [`SymbolReader`] | Per-value orchestration |
//! | [`BitReader`] / [`BitWriter`] | LSB-first bit cursor |
//!
//! ## Architecture
//!
//! ```text
//!   value (i32 / u32) + context
//!       ↓
//! ┌──────────────┐
//! │ pack_signed  │ ← zigzag, signed values only
//! └──────────────┘
//!       ↓
//! ┌──────────────┐
//! │ HybridUint   │ ← token + raw bits
//! └──────────────┘
//!       ↓ token              ↓ raw bits
//! ┌──────────────┐           │
//! │ rANS coder   │ ← Distribution of the context's cluster
//! └──────────────┘           │
//!       ↓ 16-bit chunks      ↓
//! ┌─────────────────────────────┐
//! │ BitWriter                   │ ← chunk then raw bits, per value
//! └─────────────────────────────┘
//! ```
//!
//! Decoding runs the same pipeline bottom-up. The decoder has no length
//! fields to go on: it decodes a token first and derives the raw bit count
//! from it.
//!
//! ## Example
//!
//! ```rust
//! use ans_stream::coding::{
//!     BitReader, BitWriter, Distribution, EntropyCode, HybridUintConfig, SymbolReader,
//!     SymbolWriter,
//! };
//!
//! let config = HybridUintConfig::new(4, 2, 0)?;
//! let code = EntropyCode::single(config, Distribution::flat(64)?);
//!
//! let mut symbols = SymbolWriter::new(&code);
//! symbols.write_signed(0, -3)?;
//! symbols.write(0, 1000)?;
//! let mut writer = BitWriter::new();
//! symbols.finish(&mut writer);
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! let mut symbols = SymbolReader::new(&code, &mut reader)?;
//! assert_eq!(symbols.read_signed(0, &mut reader)?, -3);
//! assert_eq!(symbols.read(0, &mut reader)?, 1000);
//! symbols.finish(&reader)?;
//! # Ok::<(), ans_stream::Error>(())
//! ```

mod ans;
mod bit_reader;
mod bit_writer;
mod distribution;
mod entropy_code;
mod hybrid_uint;
mod pack_signed;
mod symbol;


pub use ans::{AnsDecoder, AnsEncoder, ANS_INITIAL_STATE, ANS_LOWER_BOUND, ANS_SIGNATURE, RENORM_BITS};
pub use bit_reader::{BitRead, BitReader};
pub use bit_writer::BitWriter;
pub use distribution::{
    normalize_histogram, Distribution, Histogram, SymbolInfo, ANS_LOG_TAB_SIZE, ANS_TAB_SIZE,
    MAX_ALPHABET_SIZE,
};
pub use entropy_code::{
    ClusterCode, ContextCode, EntropyCode, SingleContext, MAX_CLUSTERS, MAX_CONTEXTS,
};
pub use hybrid_uint::{HybridToken, HybridUintConfig, MAX_SPLIT_EXPONENT};
pub use pack_signed::{pack_signed, unpack_signed};
pub use symbol::{SymbolReader, SymbolWriter, Token};

/// Bits needed to store values in `0..x` (`x >= 1`).
#[inline]
pub(crate) const fn ceil_log2(x: u32) -> u32 {
    if x <= 1 {
        0
    } else {
        32 - (x - 1).leading_zeros()
    }
}
