//! Entropy coding layer for image codec streams.
//!
//! Turns sequences of context-tagged integers (pixel residuals, transform
//! coefficients, side-channel metadata) into a compact, bit-exact stream and
//! back. Values are split by a hybrid uint binarizer into a token, coded by
//! an rANS range coder against a per-context distribution, and raw bits
//! written as-is.
//!
//! ## Features
//! - Core library depends only on `log` and `thiserror`
//! - `parallel` - Encode and decode independent coding units on a rayon pool
//!
//! ## Example
//!
//! ```rust
//! use ans_stream::{stream, EntropyCode, HybridUintConfig, Token};
//!
//! let tokens: Vec<Token> = (0..200).map(|i| Token::signed(i % 2, (i as i32 % 7) - 3)).collect();
//! let code = EntropyCode::from_tokens(HybridUintConfig::default(), 2, &tokens)?;
//!
//! let bytes = stream::encode_with_code(&code, &tokens)?;
//! let contexts: Vec<usize> = tokens.iter().map(|t| t.context).collect();
//! let (_, values) = stream::decode_with_code(&bytes, &contexts)?;
//! assert!(values.iter().zip(&tokens).all(|(&v, t)| v == t.value));
//! # Ok::<(), ans_stream::Error>(())
//! ```

pub mod coding;
pub mod error;
pub mod parallel;
pub mod stream;

pub use coding::{
    pack_signed, unpack_signed, ClusterCode, ContextCode, Distribution, EntropyCode, HybridToken,
    HybridUintConfig, SingleContext, SymbolReader, SymbolWriter, Token,
};
pub use error::{Error, ErrorKind, Result};
pub use parallel::{ParallelConfig, ParallelRunner};
