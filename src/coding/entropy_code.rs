//! Entropy code: the per-context tables used by a stream.
//!
//! Contexts are mapped to clusters; every cluster owns one
//! [`HybridUintConfig`] and one [`Distribution`]. Both sides of a stream
//! must hold the same code, either by building it from shared state or by
//! transmitting it with [`EntropyCode::write`].

use super::bit_reader::BitRead;
use super::bit_writer::BitWriter;
use super::ceil_log2;
use super::distribution::{Distribution, Histogram, MAX_ALPHABET_SIZE};
use super::hybrid_uint::HybridUintConfig;
use super::symbol::Token;
use crate::error::{Error, Result};

/// Largest number of contexts in one code.
pub const MAX_CONTEXTS: usize = u16::MAX as usize;

/// Largest number of clusters in one code.
pub const MAX_CLUSTERS: usize = 256;

/// Binarization and distribution shared by a group of contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCode {
    /// How values are split into token and raw bits.
    pub config: HybridUintConfig,
    /// Distribution of the tokens.
    pub distribution: Distribution,
}

impl ClusterCode {
    /// Pair a configuration with a distribution.
    pub fn new(config: HybridUintConfig, distribution: Distribution) -> Self {
        Self {
            config,
            distribution,
        }
    }
}

/// Resolves the binarization and distribution governing a context.
///
/// Implemented by [`EntropyCode`] and by the borrowed [`SingleContext`].
pub trait ContextCode {
    /// Configuration and distribution of `context`.
    ///
    /// Fails with [`Error::Table`] for an unknown context.
    fn context_code(&self, context: usize) -> Result<(HybridUintConfig, &Distribution)>;
}

/// One context coded with a borrowed distribution.
#[derive(Debug, Clone, Copy)]
pub struct SingleContext<'a> {
    /// How values are split into token and raw bits.
    pub config: HybridUintConfig,
    /// Distribution of the tokens.
    pub distribution: &'a Distribution,
}

impl<'a> SingleContext<'a> {
    /// Pair a configuration with a borrowed distribution.
    pub const fn new(config: HybridUintConfig, distribution: &'a Distribution) -> Self {
        Self {
            config,
            distribution,
        }
    }
}

impl ContextCode for SingleContext<'_> {
    #[inline]
    fn context_code(&self, context: usize) -> Result<(HybridUintConfig, &Distribution)> {
        if context == 0 {
            Ok((self.config, self.distribution))
        } else {
            Err(Error::Table(format!("context {context} outside 1 contexts")))
        }
    }
}

/// Context map plus cluster codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntropyCode {
    context_map: Vec<u8>,
    clusters: Vec<ClusterCode>,
}

impl EntropyCode {
    /// Build a code from an explicit context map.
    ///
    /// `context_map[context]` is the cluster index of `context`.
    pub fn new(context_map: Vec<u8>, clusters: Vec<ClusterCode>) -> Result<Self> {
        if context_map.is_empty() || context_map.len() > MAX_CONTEXTS {
            return Err(Error::Table(format!(
                "context count {} out of range",
                context_map.len()
            )));
        }
        if clusters.is_empty() || clusters.len() > MAX_CLUSTERS {
            return Err(Error::Table(format!(
                "cluster count {} out of range",
                clusters.len()
            )));
        }
        if let Some((context, &cluster)) = context_map
            .iter()
            .enumerate()
            .find(|(_, &cluster)| usize::from(cluster) >= clusters.len())
        {
            return Err(Error::Table(format!(
                "context {context} maps to missing cluster {cluster}"
            )));
        }
        Ok(Self {
            context_map,
            clusters,
        })
    }

    /// A code with a single context.
    pub fn single(config: HybridUintConfig, distribution: Distribution) -> Self {
        Self {
            context_map: vec![0],
            clusters: vec![ClusterCode::new(config, distribution)],
        }
    }

    /// One cluster per context.
    pub fn per_context(clusters: Vec<ClusterCode>) -> Result<Self> {
        let context_map = (0..clusters.len()).map(|i| i as u8).collect();
        Self::new(context_map, clusters)
    }

    /// Gather token statistics from `tokens` and build one cluster per
    /// context, all sharing `config`.
    pub fn from_tokens(
        config: HybridUintConfig,
        num_contexts: usize,
        tokens: &[Token],
    ) -> Result<Self> {
        if num_contexts == 0 || num_contexts > MAX_CLUSTERS {
            return Err(Error::Table(format!(
                "context count {num_contexts} out of range"
            )));
        }
        let mut histograms = vec![Histogram::new(); num_contexts];
        for token in tokens {
            let histogram = histograms.get_mut(token.context).ok_or_else(|| {
                Error::Table(format!(
                    "context {} outside {num_contexts} contexts",
                    token.context
                ))
            })?;
            let symbol = config.encode(token.value).token;
            if symbol as usize >= MAX_ALPHABET_SIZE {
                return Err(Error::Table(format!(
                    "token {symbol} for value {} exceeds the alphabet limit",
                    token.value
                )));
            }
            histogram.add(symbol);
        }
        let clusters = histograms
            .iter()
            .map(|h| Ok(ClusterCode::new(config, h.to_distribution()?)))
            .collect::<Result<Vec<_>>>()?;
        Self::per_context(clusters)
    }

    /// Number of contexts.
    pub fn num_contexts(&self) -> usize {
        self.context_map.len()
    }

    /// Number of clusters.
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Context to cluster mapping.
    pub fn context_map(&self) -> &[u8] {
        &self.context_map
    }

    /// Code governing `context`.
    #[inline]
    pub fn cluster(&self, context: usize) -> Result<&ClusterCode> {
        self.context_map
            .get(context)
            .map(|&cluster| &self.clusters[usize::from(cluster)])
            .ok_or_else(|| {
                Error::Table(format!(
                    "context {context} outside {} contexts",
                    self.context_map.len()
                ))
            })
    }

    /// Serialize the code.
    ///
    /// Layout: context count in 16 bits, cluster count minus one in 8 bits,
    /// each context's cluster in `ceil_log2(clusters)` bits, then every
    /// cluster's config and distribution.
    pub fn write(&self, writer: &mut BitWriter) {
        writer.write(16, self.context_map.len() as u32);
        writer.write(8, (self.clusters.len() - 1) as u32);
        let index_bits = ceil_log2(self.clusters.len() as u32);
        for &cluster in &self.context_map {
            writer.write(index_bits, u32::from(cluster));
        }
        for cluster in &self.clusters {
            cluster.config.write(writer);
            cluster.distribution.write(writer);
        }
    }

    /// Read a code written by [`EntropyCode::write`].
    pub fn read(reader: &mut impl BitRead) -> Result<Self> {
        let num_contexts = reader.read_bits(16)? as usize;
        let num_clusters = reader.read_bits(8)? as usize + 1;
        let index_bits = ceil_log2(num_clusters as u32);
        let context_map = (0..num_contexts)
            .map(|_| reader.read_bits(index_bits).map(|c| c as u8))
            .collect::<Result<Vec<_>>>()?;
        let clusters = (0..num_clusters)
            .map(|_| {
                let config = HybridUintConfig::read(reader)?;
                let distribution = Distribution::read(reader)?;
                Ok(ClusterCode::new(config, distribution))
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "read entropy code: {} contexts, {} clusters",
            num_contexts,
            num_clusters
        );
        Self::new(context_map, clusters)
    }
}

impl ContextCode for EntropyCode {
    #[inline]
    fn context_code(&self, context: usize) -> Result<(HybridUintConfig, &Distribution)> {
        self.cluster(context)
            .map(|cluster| (cluster.config, &cluster.distribution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::BitReader;
    use pretty_assertions::assert_eq;

    fn sample_code() -> EntropyCode {
        let clusters = vec![
            ClusterCode::new(
                HybridUintConfig::default(),
                Distribution::from_histogram(&[10, 4, 1, 0, 2]).unwrap(),
            ),
            ClusterCode::new(
                HybridUintConfig::new(0, 0, 0).unwrap(),
                Distribution::flat(256).unwrap(),
            ),
            ClusterCode::new(
                HybridUintConfig::new(4, 1, 1).unwrap(),
                Distribution::from_frequencies(&[4096]).unwrap(),
            ),
        ];
        EntropyCode::new(vec![0, 1, 1, 2, 0], clusters).unwrap()
    }

    #[test]
    fn test_cluster_lookup() {
        let code = sample_code();
        assert_eq!(code.num_contexts(), 5);
        assert_eq!(code.num_clusters(), 3);
        assert!(code.cluster(2).unwrap().config.is_identity());
        assert!(matches!(code.cluster(5), Err(Error::Table(_))));
    }

    #[test]
    fn test_rejects_dangling_cluster() {
        let clusters = vec![ClusterCode::new(
            HybridUintConfig::default(),
            Distribution::flat(2).unwrap(),
        )];
        assert!(EntropyCode::new(vec![0, 1], clusters.clone()).is_err());
        assert!(EntropyCode::new(vec![], clusters).is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let code = sample_code();
        let mut writer = BitWriter::new();
        code.write(&mut writer);
        let bytes = writer.finish();
        assert_eq!(EntropyCode::read(&mut BitReader::new(&bytes)).unwrap(), code);
    }

    #[test]
    fn test_from_tokens() {
        let tokens = [
            Token::new(0, 3),
            Token::new(0, 3),
            Token::new(1, 100),
            Token::signed(1, -2),
        ];
        let code = EntropyCode::from_tokens(HybridUintConfig::default(), 3, &tokens).unwrap();
        assert_eq!(code.num_contexts(), 3);

        let first = &code.cluster(0).unwrap().distribution;
        assert_eq!(first.frequency(3), 4096);

        let second = &code.cluster(1).unwrap().distribution;
        let token = HybridUintConfig::default().encode(100).token;
        assert_eq!(second.frequency(token), 2048);
        assert_eq!(second.frequency(3), 2048);

        // unused context still gets a usable table
        assert_eq!(code.cluster(2).unwrap().distribution.frequency(0), 4096);

        assert!(EntropyCode::from_tokens(HybridUintConfig::default(), 1, &tokens).is_err());
    }

    #[test]
    fn test_single_context_borrows_table() {
        let distribution = Distribution::flat(8).unwrap();
        let single = SingleContext::new(HybridUintConfig::default(), &distribution);
        let (config, table) = single.context_code(0).unwrap();
        assert_eq!(config, HybridUintConfig::default());
        assert!(std::ptr::eq(table, &distribution));
        assert!(matches!(single.context_code(1), Err(Error::Table(_))));

        let code = sample_code();
        let (config, table) = code.context_code(3).unwrap();
        assert_eq!(config, HybridUintConfig::new(4, 1, 1).unwrap());
        assert_eq!(table.frequency(0), 4096);
    }
}
