//! WikiText corpus builder
//!
//! Turns the JSON-lines output of WikiExtractor into a WikiText-style
//! language-modelling corpus: tokenized articles, each introduced by a
//! `= Title =` line, split into train/valid/test files by token budget.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wikitext::{build, BuildOptions};
//!
//! let options = BuildOptions::new("data/wiki_extr/de", "data/wiki", "de")
//!     .with_max_tokens(100_000_000);
//! let summary = build(&options)?;
//! println!("{} train documents", summary.splits[0].stats.documents);
//! ```
//!
//! # Modules
//!
//! - [`article`] - Streaming reader over extractor output
//! - [`tokenizer`] - Paragraph tokenizers
//! - [`corpus`] - Token counting, budgets and split writing
//! - [`builder`] - The full build

pub mod article;
pub mod builder;
pub mod corpus;
pub mod error;
pub mod tokenizer;

pub use article::{read_articles, Article, ArticleReader};
pub use builder::{build, build_with, is_built, BuildOptions, BuildSummary, SplitReport, SPLITS};
pub use corpus::{SplitStats, MIN_ARTICLE_TOKENS};
pub use error::{Result, WikitextError};
pub use tokenizer::{PunctTokenizer, Tokenizer, WhitespaceTokenizer};
