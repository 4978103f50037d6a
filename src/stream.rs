//! Whole-stream encode and decode.
//!
//! Convenience entry points over [`SymbolWriter`] and [`SymbolReader`]. Each
//! call produces or consumes one complete stream: the coder state, the coded
//! values and the zero padding of the last byte.
//!
//! The decoder is told how many values to read (or which context each one
//! uses); streams carry no length field.
//!
//! ## Example
//!
//! ```rust
//! use ans_stream::{stream, Distribution, HybridUintConfig};
//!
//! let config = HybridUintConfig::default();
//! let distribution = Distribution::flat(40)?;
//! let values = [0, 1, 0, 2, 17, 300, 0];
//!
//! let bytes = stream::encode(config, &distribution, &values)?;
//! assert_eq!(stream::decode(config, &distribution, &bytes, values.len())?, values);
//! # Ok::<(), ans_stream::Error>(())
//! ```

use crate::coding::{
    pack_signed, unpack_signed, BitReader, BitWriter, ContextCode, Distribution, EntropyCode,
    HybridUintConfig, SingleContext, SymbolReader, SymbolWriter, Token,
};
use crate::error::Result;
use crate::parallel::ParallelRunner;

/// Encode `values` with a single distribution.
pub fn encode(
    config: HybridUintConfig,
    distribution: &Distribution,
    values: &[u32],
) -> Result<Vec<u8>> {
    let code = SingleContext::new(config, distribution);
    let mut symbols = SymbolWriter::with_capacity(&code, values.len());
    for &value in values {
        symbols.write(0, value)?;
    }
    Ok(finish_stream(symbols, BitWriter::with_capacity(values.len())))
}

/// Decode `count` values written by [`encode`].
pub fn decode(
    config: HybridUintConfig,
    distribution: &Distribution,
    bytes: &[u8],
    count: usize,
) -> Result<Vec<u32>> {
    let code = SingleContext::new(config, distribution);
    let mut reader = BitReader::new(bytes);
    let mut symbols = SymbolReader::new(&code, &mut reader)?;
    let values = (0..count)
        .map(|_| symbols.read(0, &mut reader))
        .collect::<Result<Vec<_>>>()?;
    symbols.finish(&reader)?;
    log::debug!("decoded {} values from {} bytes", values.len(), bytes.len());
    Ok(values)
}

/// Encode signed values, zigzag packed.
pub fn encode_signed(
    config: HybridUintConfig,
    distribution: &Distribution,
    values: &[i32],
) -> Result<Vec<u8>> {
    let packed: Vec<u32> = values.iter().map(|&v| pack_signed(v)).collect();
    encode(config, distribution, &packed)
}

/// Decode `count` signed values written by [`encode_signed`].
pub fn decode_signed(
    config: HybridUintConfig,
    distribution: &Distribution,
    bytes: &[u8],
    count: usize,
) -> Result<Vec<i32>> {
    decode(config, distribution, bytes, count)
        .map(|values| values.into_iter().map(unpack_signed).collect())
}

/// Encode context-tagged values with `code`.
pub fn encode_tokens(code: &EntropyCode, tokens: &[Token]) -> Result<Vec<u8>> {
    let symbols = queue_tokens(code, tokens)?;
    Ok(finish_stream(symbols, BitWriter::with_capacity(tokens.len())))
}

/// Decode one value per entry of `contexts`, each coded in that context.
pub fn decode_tokens(code: &EntropyCode, bytes: &[u8], contexts: &[usize]) -> Result<Vec<u32>> {
    let mut reader = BitReader::new(bytes);
    let values = read_values(code, &mut reader, contexts)?;
    log::debug!("decoded {} values from {} bytes", values.len(), bytes.len());
    Ok(values)
}

/// Encode a self-describing stream: `code` followed by the coded tokens.
pub fn encode_with_code(code: &EntropyCode, tokens: &[Token]) -> Result<Vec<u8>> {
    let symbols = queue_tokens(code, tokens)?;
    let mut writer = BitWriter::with_capacity(tokens.len());
    code.write(&mut writer);
    Ok(finish_stream(symbols, writer))
}

/// Decode a stream written by [`encode_with_code`], returning the code it
/// carried along with the values.
pub fn decode_with_code(bytes: &[u8], contexts: &[usize]) -> Result<(EntropyCode, Vec<u32>)> {
    let mut reader = BitReader::new(bytes);
    let code = EntropyCode::read(&mut reader)?;
    let values = read_values(&code, &mut reader, contexts)?;
    log::debug!(
        "decoded {} values and a {}-context code from {} bytes",
        values.len(),
        code.num_contexts(),
        bytes.len()
    );
    Ok((code, values))
}

/// Encode independent units, one stream each, through `runner`.
///
/// A failing unit does not affect the others; its error is wrapped in
/// [`Error::Unit`](crate::Error::Unit).
pub fn encode_units<U>(runner: &ParallelRunner, code: &EntropyCode, units: &[U]) -> Vec<Result<Vec<u8>>>
where
    U: AsRef<[Token]> + Sync,
{
    runner.map(units.len(), |unit| {
        encode_tokens(code, units[unit].as_ref()).map_err(|e| {
            log::warn!("encoding unit {unit} failed: {e}");
            e.in_unit(unit)
        })
    })
}

/// Decode independent units through `runner`.
///
/// Each unit is its stream bytes and the context of every value in it.
pub fn decode_units(
    runner: &ParallelRunner,
    code: &EntropyCode,
    units: &[(&[u8], &[usize])],
) -> Vec<Result<Vec<u32>>> {
    runner.map(units.len(), |unit| {
        let (bytes, contexts) = units[unit];
        decode_tokens(code, bytes, contexts).map_err(|e| {
            log::warn!("decoding unit {unit} failed: {e}");
            e.in_unit(unit)
        })
    })
}

fn queue_tokens<'a>(code: &'a EntropyCode, tokens: &[Token]) -> Result<SymbolWriter<'a>> {
    let mut symbols = SymbolWriter::with_capacity(code, tokens.len());
    for &token in tokens {
        symbols.write_token(token)?;
    }
    Ok(symbols)
}

fn finish_stream<C: ContextCode + ?Sized>(symbols: SymbolWriter<'_, C>, mut writer: BitWriter) -> Vec<u8> {
    let count = symbols.len();
    symbols.finish(&mut writer);
    let bytes = writer.finish();
    log::debug!("encoded {} values into {} bytes", count, bytes.len());
    bytes
}

fn read_values(
    code: &EntropyCode,
    reader: &mut BitReader<'_>,
    contexts: &[usize],
) -> Result<Vec<u32>> {
    let mut symbols = SymbolReader::new(code, reader)?;
    let values = contexts
        .iter()
        .map(|&context| symbols.read(context, reader))
        .collect::<Result<Vec<_>>>()?;
    symbols.finish(reader)?;
    Ok(values)
}
