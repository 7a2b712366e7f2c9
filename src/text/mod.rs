//! Token-stream filters that turn raw evidence text into search terms.
//!
//! - [`tokenizer`]: the [`TokenStream`] contract, a whitespace tokenizer and a
//!   lowercase filter.
//! - [`alphanumeric`]: splits tokens on non-alphanumeric runs while keeping
//!   term positions intact.
//! - [`pair`]: augments a stream with the concatenation of adjacent tokens.
//! - [`analyzer`]: the composed chain used for evidence search fields.

pub mod alphanumeric;
pub mod analyzer;
pub mod pair;
pub mod tokenizer;

pub use alphanumeric::AlphanumericSplitter;
pub use analyzer::SearchFieldAnalyzer;
pub use pair::TokenPairConcatenator;
pub use tokenizer::{LowerCaseFilter, Token, TokenStream, WhitespaceTokenizer};
