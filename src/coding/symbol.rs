//! Symbol reader and writer.
//!
//! Glue between the sign mapper, the hybrid uint binarizer and the rANS
//! coder. Per value the stream carries, in order: the renormalization chunk
//! produced while coding its token (if any), then its raw bits.
//!
//! ```text
//! | state:32 | [chunk:16] raw(v0) | [chunk:16] raw(v1) | ... | pad |
//! ```

use super::ans::{AnsDecoder, AnsEncoder, RENORM_BITS};
use super::bit_reader::BitRead;
use super::bit_writer::BitWriter;
use super::distribution::SymbolInfo;
use super::entropy_code::{ContextCode, EntropyCode};
use super::hybrid_uint::HybridToken;
use super::pack_signed::{pack_signed, unpack_signed};
use crate::error::{Error, Result};

/// A value tagged with its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Context selecting the distribution.
    pub context: usize,
    /// Unsigned value (signed values are zigzag packed).
    pub value: u32,
}

impl Token {
    /// Tag an unsigned value.
    pub const fn new(context: usize, value: u32) -> Self {
        Self { context, value }
    }

    /// Tag a signed value, zigzag packing it.
    pub const fn signed(context: usize, value: i32) -> Self {
        Self {
            context,
            value: pack_signed(value),
        }
    }
}

/// Binarized value waiting for the reverse rANS pass.
#[derive(Debug, Clone, Copy)]
struct PendingSymbol {
    info: SymbolInfo,
    nbits: u32,
    bits: u32,
}

/// Buffers values and writes them as one rANS stream.
///
/// rANS emits in reverse, so nothing reaches the bit writer until
/// [`SymbolWriter::finish`].
pub struct SymbolWriter<'a, C: ?Sized = EntropyCode> {
    code: &'a C,
    pending: Vec<PendingSymbol>,
}

impl<'a, C: ContextCode + ?Sized> SymbolWriter<'a, C> {
    /// Create a writer for `code`.
    pub fn new(code: &'a C) -> Self {
        Self {
            code,
            pending: Vec::new(),
        }
    }

    /// Create a writer with room for `capacity` values.
    pub fn with_capacity(code: &'a C, capacity: usize) -> Self {
        Self {
            code,
            pending: Vec::with_capacity(capacity),
        }
    }

    /// Queue an unsigned value in `context`.
    ///
    /// Fails with [`Error::Table`] if the context is unknown or its
    /// distribution cannot code the value's token.
    pub fn write(&mut self, context: usize, value: u32) -> Result<()> {
        let (config, distribution) = self.code.context_code(context)?;
        let HybridToken { token, nbits, bits } = config.encode(value);
        let info = distribution.encode_info(token).map_err(|e| match e {
            Error::Table(msg) => Error::Table(format!("context {context}, value {value}: {msg}")),
            other => other,
        })?;
        self.pending.push(PendingSymbol { info, nbits, bits });
        Ok(())
    }

    /// Queue a signed value in `context`.
    pub fn write_signed(&mut self, context: usize, value: i32) -> Result<()> {
        self.write(context, pack_signed(value))
    }

    /// Queue a tagged value.
    pub fn write_token(&mut self, token: Token) -> Result<()> {
        self.write(token.context, token.value)
    }

    /// Number of queued values.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no value is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run the coder over all queued values and write the stream.
    pub fn finish(self, writer: &mut BitWriter) {
        let mut encoder = AnsEncoder::new();
        // (nbits, bits) in reverse stream order
        let mut pieces = Vec::with_capacity(self.pending.len() * 2);
        for symbol in self.pending.iter().rev() {
            pieces.push((symbol.nbits, symbol.bits));
            if let Some(chunk) = encoder.put_symbol(symbol.info) {
                pieces.push((RENORM_BITS, chunk));
            }
        }

        writer.write(32, encoder.state());
        for &(nbits, bits) in pieces.iter().rev() {
            writer.write(nbits, bits);
        }
        log::trace!(
            "wrote {} symbols, {} bits",
            self.pending.len(),
            writer.bit_len()
        );
    }
}

/// Reads values back from a stream written by [`SymbolWriter`].
pub struct SymbolReader<'a, C: ?Sized = EntropyCode> {
    code: &'a C,
    decoder: AnsDecoder,
}

impl<'a, C: ContextCode + ?Sized> SymbolReader<'a, C> {
    /// Read the initial coder state from `reader`.
    pub fn new(code: &'a C, reader: &mut impl BitRead) -> Result<Self> {
        Ok(Self {
            code,
            decoder: AnsDecoder::new(reader)?,
        })
    }

    /// Read the next unsigned value, coded in `context`.
    ///
    /// The token comes first; it alone tells how many raw bits follow.
    #[inline]
    pub fn read(&mut self, context: usize, reader: &mut impl BitRead) -> Result<u32> {
        let (config, distribution) = self.code.context_code(context)?;
        let token = self.decoder.read_symbol(distribution, reader)?;
        let nbits = config.raw_bit_count(token)?;
        let bits = reader.read_bits(nbits)?;
        config.decode(token, bits)
    }

    /// Read the next signed value, coded in `context`.
    pub fn read_signed(&mut self, context: usize, reader: &mut impl BitRead) -> Result<i32> {
        self.read(context, reader).map(unpack_signed)
    }

    /// Check the terminal state and that only zero padding is left.
    pub fn finish(self, reader: &impl BitRead) -> Result<()> {
        self.decoder.check_final_state()?;
        let remaining = reader.remaining_bits();
        if remaining >= 8 {
            return Err(Error::StreamDesync(format!(
                "{remaining} unread bits after the last symbol"
            )));
        }
        if reader.peek_bits(remaining as u32) != 0 {
            return Err(Error::StreamDesync("nonzero padding bits".to_string()));
        }
        Ok(())
    }
}
