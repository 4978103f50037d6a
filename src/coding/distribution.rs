//! Context distribution tables.
//!
//! A [`Distribution`] holds normalized symbol frequencies summing exactly to
//! [`ANS_TAB_SIZE`], their cumulative offsets, and a slot table mapping each
//! of the `ANS_TAB_SIZE` state slots to the symbol that owns it, so decoding
//! a symbol is a single lookup.
//!
//! Tables are built once per context (or cluster of contexts) and are
//! read-only afterwards; they are `Send + Sync` and may be shared across
//! threads decoding different units.

use super::bit_reader::BitRead;
use super::bit_writer::BitWriter;
use crate::error::{Error, Result};

/// Log2 of the frequency total.
pub const ANS_LOG_TAB_SIZE: u32 = 12;

/// Sum of all frequencies in a normalized table.
pub const ANS_TAB_SIZE: u32 = 1 << ANS_LOG_TAB_SIZE;

/// Largest number of symbols in one table.
pub const MAX_ALPHABET_SIZE: usize = 256;

/// Bits used to store the length of one serialized frequency.
const FREQ_LENGTH_BITS: u32 = 4;

/// Normalized symbol distribution for one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    freqs: Vec<u16>,
    /// cumulative[i] = sum of freqs[..i]
    cumulative: Vec<u16>,
    /// Slot -> symbol, `ANS_TAB_SIZE` entries
    slots: Box<[u8]>,
}

/// Frequency and cumulative offset of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolInfo {
    /// The symbol.
    pub symbol: u32,
    /// Normalized frequency.
    pub freq: u32,
    /// Sum of the frequencies of all lower symbols.
    pub cumulative: u32,
}

impl Distribution {
    /// Normalize a histogram of observed token counts.
    ///
    /// See [`normalize_histogram`] for the rounding rules.
    pub fn from_histogram(counts: &[u32]) -> Result<Self> {
        let freqs = normalize_histogram(counts)?;
        Self::from_frequencies(&freqs)
    }

    /// Build from an explicit table.
    ///
    /// The frequencies must sum to exactly [`ANS_TAB_SIZE`]. Symbols with a
    /// zero frequency are allowed but cannot be encoded.
    pub fn from_frequencies(freqs: &[u16]) -> Result<Self> {
        if freqs.is_empty() {
            return Err(Error::Table("empty frequency table".to_string()));
        }
        if freqs.len() > MAX_ALPHABET_SIZE {
            return Err(Error::Table(format!(
                "alphabet of {} symbols exceeds {MAX_ALPHABET_SIZE}",
                freqs.len()
            )));
        }
        let total: u32 = freqs.iter().map(|&f| u32::from(f)).sum();
        if total != ANS_TAB_SIZE {
            return Err(Error::Table(format!(
                "frequencies sum to {total}, expected {ANS_TAB_SIZE}"
            )));
        }

        let mut cumulative = Vec::with_capacity(freqs.len());
        let mut slots = vec![0u8; ANS_TAB_SIZE as usize].into_boxed_slice();
        let mut start = 0usize;
        for (symbol, &freq) in freqs.iter().enumerate() {
            cumulative.push(start as u16);
            let end = start + usize::from(freq);
            slots[start..end].fill(symbol as u8);
            start = end;
        }

        Ok(Self {
            freqs: freqs.to_vec(),
            cumulative,
            slots,
        })
    }

    /// Uniform distribution over `alphabet_size` symbols.
    ///
    /// The remainder of `ANS_TAB_SIZE / alphabet_size` goes to the lowest
    /// symbols.
    pub fn flat(alphabet_size: usize) -> Result<Self> {
        if alphabet_size == 0 || alphabet_size > MAX_ALPHABET_SIZE {
            return Err(Error::Table(format!(
                "flat alphabet size {alphabet_size} out of range"
            )));
        }
        let base = ANS_TAB_SIZE as usize / alphabet_size;
        let extra = ANS_TAB_SIZE as usize % alphabet_size;
        let freqs: Vec<u16> = (0..alphabet_size)
            .map(|i| (base + usize::from(i < extra)) as u16)
            .collect();
        Self::from_frequencies(&freqs)
    }

    /// Number of symbols in the table, including zero-frequency ones.
    pub fn alphabet_size(&self) -> usize {
        self.freqs.len()
    }

    /// Normalized frequencies.
    pub fn frequencies(&self) -> &[u16] {
        &self.freqs
    }

    /// Frequency of `symbol`, 0 outside the alphabet.
    pub fn frequency(&self, symbol: u32) -> u32 {
        self.freqs
            .get(symbol as usize)
            .map_or(0, |&f| u32::from(f))
    }

    /// Frequency and offset for encoding `symbol`.
    ///
    /// Fails with [`Error::Table`] if the symbol cannot be coded.
    #[inline]
    pub fn encode_info(&self, symbol: u32) -> Result<SymbolInfo> {
        match self.freqs.get(symbol as usize) {
            Some(&freq) if freq > 0 => Ok(SymbolInfo {
                symbol,
                freq: u32::from(freq),
                cumulative: u32::from(self.cumulative[symbol as usize]),
            }),
            Some(_) => Err(Error::Table(format!("symbol {symbol} has zero frequency"))),
            None => Err(Error::Table(format!(
                "symbol {symbol} outside alphabet of {}",
                self.freqs.len()
            ))),
        }
    }

    /// Symbol owning `slot` (`slot < ANS_TAB_SIZE`).
    #[inline]
    pub fn lookup(&self, slot: u32) -> SymbolInfo {
        let symbol = self.slots[slot as usize] as usize;
        SymbolInfo {
            symbol: symbol as u32,
            freq: u32::from(self.freqs[symbol]),
            cumulative: u32::from(self.cumulative[symbol]),
        }
    }

    /// Serialize the table.
    ///
    /// Layout: `alphabet_size - 1` in 8 bits, then per symbol the bit length
    /// `k` of its frequency in 4 bits (0 for an absent symbol) followed by
    /// the `k - 1` bits below the leading one.
    pub fn write(&self, writer: &mut BitWriter) {
        writer.write(8, (self.freqs.len() - 1) as u32);
        for &freq in &self.freqs {
            let freq = u32::from(freq);
            let length = 32 - freq.leading_zeros();
            writer.write(FREQ_LENGTH_BITS, length);
            if length > 1 {
                writer.write(length - 1, freq - (1 << (length - 1)));
            }
        }
    }

    /// Read a table written by [`Distribution::write`].
    pub fn read(reader: &mut impl BitRead) -> Result<Self> {
        let alphabet_size = reader.read_bits(8)? as usize + 1;
        let mut freqs = Vec::with_capacity(alphabet_size);
        for symbol in 0..alphabet_size {
            let length = reader.read_bits(FREQ_LENGTH_BITS)?;
            let freq = match length {
                0 => 0,
                1..=13 => (1 << (length - 1)) | reader.read_bits(length - 1)?,
                _ => {
                    return Err(Error::StreamDesync(format!(
                        "frequency length {length} for symbol {symbol}"
                    )))
                }
            };
            if freq > ANS_TAB_SIZE {
                return Err(Error::Table(format!(
                    "frequency {freq} of symbol {symbol} exceeds {ANS_TAB_SIZE}"
                )));
            }
            freqs.push(freq as u16);
        }
        Self::from_frequencies(&freqs)
    }
}

/// Scale `counts` to frequencies summing exactly to [`ANS_TAB_SIZE`].
///
/// Each nonzero count gets `floor(count * ANS_TAB_SIZE / total)`, clamped to
/// at least 1. A shortfall is handed out one unit at a time by largest
/// remainder (ties go to the lower symbol). An excess caused by clamping is
/// taken one unit at a time from the largest bucket (ties go to the lower
/// symbol). The result depends only on `counts`.
pub fn normalize_histogram(counts: &[u32]) -> Result<Vec<u16>> {
    if counts.is_empty() {
        return Err(Error::Table("empty histogram".to_string()));
    }
    if counts.len() > MAX_ALPHABET_SIZE {
        return Err(Error::Table(format!(
            "histogram of {} symbols exceeds {MAX_ALPHABET_SIZE}",
            counts.len()
        )));
    }
    let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
    if total == 0 {
        return Err(Error::Table("histogram has no nonzero bucket".to_string()));
    }

    let mut freqs = vec![0u32; counts.len()];
    // (remainder, symbol) of buckets that were not clamped
    let mut remainders = Vec::with_capacity(counts.len());
    let mut clamped = 0usize;
    for (symbol, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let scaled = u64::from(count) * u64::from(ANS_TAB_SIZE);
        let floor = scaled / total;
        if floor == 0 {
            freqs[symbol] = 1;
            clamped += 1;
        } else {
            freqs[symbol] = floor as u32;
            remainders.push((scaled % total, symbol));
        }
    }

    let sum: u32 = freqs.iter().sum();
    if sum < ANS_TAB_SIZE {
        remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let mut deficit = ANS_TAB_SIZE - sum;
        if remainders.is_empty() {
            let largest = largest_bucket(&freqs);
            freqs[largest] += deficit;
            deficit = 0;
        }
        for &(_, symbol) in remainders.iter().cycle() {
            if deficit == 0 {
                break;
            }
            freqs[symbol] += 1;
            deficit -= 1;
        }
    } else {
        for _ in ANS_TAB_SIZE..sum {
            let largest = largest_bucket(&freqs);
            freqs[largest] -= 1;
        }
    }

    log::debug!(
        "normalized histogram: {} symbols, {} nonzero, {} clamped",
        counts.len(),
        counts.iter().filter(|&&c| c > 0).count(),
        clamped
    );

    Ok(freqs.into_iter().map(|f| f as u16).collect())
}

/// Index of the largest bucket, lowest index on ties.
fn largest_bucket(freqs: &[u32]) -> usize {
    let mut best = 0;
    for (i, &f) in freqs.iter().enumerate() {
        if f > freqs[best] {
            best = i;
        }
    }
    best
}

/// Token counts gathered for one context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u32>,
}

impl Histogram {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `symbol`.
    pub fn add(&mut self, symbol: u32) {
        let symbol = symbol as usize;
        if symbol >= self.counts.len() {
            self.counts.resize(symbol + 1, 0);
        }
        self.counts[symbol] += 1;
    }

    /// Counts indexed by symbol.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Total number of counted symbols.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Normalize into a distribution.
    ///
    /// An empty histogram yields a single-symbol table, so contexts that
    /// were never used still have a valid code.
    pub fn to_distribution(&self) -> Result<Distribution> {
        if self.total() == 0 {
            return Distribution::from_histogram(&[1]);
        }
        Distribution::from_histogram(&self.counts)
    }
}
