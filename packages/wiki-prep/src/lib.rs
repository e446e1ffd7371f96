//! Wikipedia corpus acquisition pipeline
//!
//! Downloads Wikipedia dumps, runs WikiExtractor over them and hands the
//! extracted articles to a dataset builder, once per configured language.
//! Each step is skipped when its output path already exists, except the
//! final dataset build which always runs.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wiki_prep::{Config, Pipeline, ProcessSteps};
//!
//! let config = Config::load(None)?;
//! let pipeline = Pipeline::from_config(&config, ProcessSteps::from_config(&config)?)?;
//! let report = pipeline.run().await?;
//! ```
//!
//! # Modules
//!
//! - [`layout`] - Paths and URLs derived from the root and language code
//! - [`pipeline`] - The sequential driver
//! - [`steps`] - Step trait and the process-backed implementation
//! - [`download`] - Resumable HTTP downloads
//! - [`cmd_builder`] - External process runner
//! - [`config`] - TOML configuration
//! - [`testing`] - Mock steps for tests

pub mod cmd_builder;
pub mod config;
pub mod download;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod steps;
pub mod testing;

pub use config::Config;
pub use error::{PipelineError, Result, Step};
pub use layout::{dump_url, LanguageCode, Layout};
pub use pipeline::{LanguageReport, LanguageStatus, Pipeline, RunReport, StepOutcome};
pub use steps::{PipelineSteps, ProcessSteps};
