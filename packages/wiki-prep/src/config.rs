//! Configuration for wiki-prep.
//!
//! Loaded from an optional TOML file, `wiki-prep.toml` in the working
//! directory by default (override with `WIKI_PREP_CONFIG` or `--config`).
//! Every key has a default, so an absent file gives the stock pipeline:
//!
//! ```toml
//! [pipeline]
//! root = "data"
//! languages = ["de", "es", "fr", "it", "ja", "pl", "ru", "zh"]
//! max_tokens = 100000000
//!
//! [dump]
//! url_template = "https://dumps.wikimedia.org/{lang}wiki/latest/{lang}wiki-latest-pages-articles.xml.bz2"
//!
//! [extractor]
//! repo_url = "https://github.com/attardi/wikiextractor.git"
//! python = "python3"
//! module = "wikiextractor.WikiExtractor"
//!
//! [dataset]
//! # command = ["python3", "create_wikitext.py"]
//! ```

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::layout::{LanguageCode, DEFAULT_DUMP_URL_TEMPLATE};

pub const DEFAULT_CONFIG_FILE: &str = "wiki-prep.toml";
pub const CONFIG_ENV_VAR: &str = "WIKI_PREP_CONFIG";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub dump: DumpConfig,
    pub extractor: ExtractorConfig,
    pub dataset: DatasetConfig,
}

// =============================================================================
// [pipeline]
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root directory for dumps, extraction output and the final corpus
    pub root: PathBuf,
    /// Language codes, processed in this order
    pub languages: Vec<String>,
    /// Token budget handed to the dataset builder
    pub max_tokens: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            languages: default_languages(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_languages() -> Vec<String> {
    ["de", "es", "fr", "it", "ja", "pl", "ru", "zh"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_tokens() -> u64 {
    100_000_000
}

// =============================================================================
// [dump]
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Dump URL; every `{lang}` is replaced by the language code
    pub url_template: String,
    pub user_agent: String,
    /// TCP connect timeout; the transfer itself is not time-limited
    pub connect_timeout_secs: u64,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_DUMP_URL_TEMPLATE.to_string(),
            user_agent: default_user_agent(),
            connect_timeout_secs: 30,
        }
    }
}

fn default_user_agent() -> String {
    format!("wiki-prep/{}", env!("CARGO_PKG_VERSION"))
}

// =============================================================================
// [extractor]
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Git repository cloned into `<root>/wikiextractor`
    pub repo_url: String,
    /// Python interpreter used to install and run the extractor
    pub python: String,
    /// Extractor module, run as `<python> -m <module>` with the checkout on
    /// `PYTHONPATH`
    pub module: String,
    /// Arguments placed before `-o <out> <dump>`
    pub args: Vec<String>,
    /// One-time install command, run inside the checkout. When unset,
    /// `<python> setup.py install`; an empty list skips installing.
    pub install: Option<Vec<String>>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            repo_url: "https://github.com/attardi/wikiextractor.git".to_string(),
            python: "python3".to_string(),
            module: "wikiextractor.WikiExtractor".to_string(),
            args: ["--json", "-q", "-b", "100M", "--processes", "4"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            install: None,
        }
    }
}

impl ExtractorConfig {
    /// The install argv, defaulting to the configured interpreter.
    pub fn install_command(&self) -> Vec<String> {
        match &self.install {
            Some(command) => command.clone(),
            None => vec![
                self.python.clone(),
                "setup.py".to_string(),
                "install".to_string(),
            ],
        }
    }
}

// =============================================================================
// [dataset]
// =============================================================================

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatasetConfig {
    /// Formatter program and leading arguments. When unset, the running
    /// binary's own `wikitext` subcommand is used.
    pub command: Option<Vec<String>>,
}

impl DatasetConfig {
    /// True when the build step runs the bundled `wikitext` subcommand.
    pub fn uses_builtin(&self) -> bool {
        self.command.as_ref().map_or(true, |c| c.is_empty())
    }
}

impl Config {
    /// Load from `explicit`, else `$WIKI_PREP_CONFIG`, else `./wiki-prep.toml`.
    ///
    /// Only the implicit default path may be missing.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => match env::var(CONFIG_ENV_VAR) {
                Ok(p) if !p.is_empty() => (PathBuf::from(p), true),
                _ => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            },
        };

        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| PipelineError::io(&path, e))?;
        Self::from_toml(&content, &path)
    }

    pub fn from_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| PipelineError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validated language list, in configured order.
    pub fn languages(&self) -> Result<Vec<LanguageCode>> {
        self.pipeline
            .languages
            .iter()
            .map(|code| LanguageCode::new(code.as_str()))
            .collect()
    }
}
