//! Error types for entropy encoding and decoding.
//!
//! This module provides the [`Error`] type which covers every failure the
//! coding layer can report. All errors are scoped to one coding unit: a bad
//! stream never poisons sibling units decoded by the same runner.
//!
//! ## Error Categories
//!
//! | Kind | Errors | Detected |
//! |------|--------|----------|
//! | Config | [`Config`] | When a [`HybridUintConfig`] is built |
//! | Table | [`Table`] | When a distribution is built, or a symbol it cannot code is encoded |
//! | Desync | [`StreamDesync`] | While decoding, or at the terminal state check |
//! | Truncation | [`TruncatedInput`] | When the bit cursor runs past the end of the buffer |
//!
//! Multi-unit entry points wrap failures in [`Error::Unit`] so the caller
//! learns which unit failed. [`Error::kind`] looks through that wrapper.
//!
//! ## Example
//!
//! ```rust
//! use ans_stream::{ErrorKind, HybridUintConfig};
//!
//! let err = HybridUintConfig::new(2, 2, 1).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Config);
//! ```
//!
//! [`Config`]: Error::Config
//! [`Table`]: Error::Table
//! [`StreamDesync`]: Error::StreamDesync
//! [`TruncatedInput`]: Error::TruncatedInput
//! [`HybridUintConfig`]: crate::HybridUintConfig

use thiserror::Error;

/// Error type for entropy coding operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The hybrid uint configuration violates
    /// `msb_in_token + lsb_in_token <= split_exponent <= 32`.
    #[error(
        "invalid hybrid uint config: split_exponent={split_exponent}, \
         msb_in_token={msb_in_token}, lsb_in_token={lsb_in_token}"
    )]
    Config {
        /// Exponent below which values are coded directly as tokens.
        split_exponent: u32,
        /// Most significant bits folded into the token.
        msb_in_token: u32,
        /// Least significant bits folded into the token.
        lsb_in_token: u32,
    },

    /// A distribution table is malformed, or cannot code a requested symbol.
    #[error("invalid distribution table: {0}")]
    Table(String),

    /// The decoded stream is inconsistent with the entropy code.
    ///
    /// Everything decoded from the same unit after this point is meaningless.
    #[error("stream desynchronized: {0}")]
    StreamDesync(String),

    /// The bit cursor reached the end of the buffer while more bits were needed.
    #[error("truncated input: needed {needed} more bits, {available} available")]
    TruncatedInput {
        /// Number of bits requested.
        needed: u64,
        /// Number of bits left in the buffer.
        available: u64,
    },

    /// A coding unit dispatched through a runner failed.
    #[error("coding unit {index} failed: {source}")]
    Unit {
        /// Index of the failing unit.
        index: usize,
        /// The unit's own error.
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid binarizer configuration.
    Config,
    /// Invalid or insufficient distribution table.
    Table,
    /// Decoded data does not match the code.
    StreamDesync,
    /// Input ended early.
    TruncatedInput,
}

impl Error {
    /// Classify this error, looking through [`Error::Unit`] wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Table(_) => ErrorKind::Table,
            Self::StreamDesync(_) => ErrorKind::StreamDesync,
            Self::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            Self::Unit { source, .. } => source.kind(),
        }
    }

    /// Attach a unit index to this error.
    pub fn in_unit(self, index: usize) -> Self {
        Self::Unit {
            index,
            source: Box::new(self),
        }
    }

    /// The failing unit index, if this error came from a multi-unit call.
    pub fn unit(&self) -> Option<usize> {
        match self {
            Self::Unit { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Result alias for entropy coding operations.
pub type Result<T> = std::result::Result<T, Error>;
