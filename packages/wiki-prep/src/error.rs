//! Typed errors for the acquisition pipeline.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The four guarded actions run for every language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Fetch,
    Install,
    Extract,
    Build,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Fetch => "fetch",
            Step::Install => "install extractor",
            Step::Extract => "extract",
            Step::Build => "build dataset",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A step failed for a specific language; aborts the run
    #[error("{step} failed for '{lang}': {source}")]
    Step {
        lang: String,
        step: Step,
        #[source]
        source: Box<PipelineError>,
    },

    /// Language code is not a plausible Wikipedia edition identifier
    #[error("invalid language code: {0:?}")]
    InvalidLanguage(String),

    /// Filesystem operation failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request could not be sent or the body could not be read
    #[error("download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    /// External process could not be started
    #[error("failed to start: {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// External process exited unsuccessfully
    #[error("{command} exited with code {code}")]
    CommandFailed { command: String, code: i32 },

    /// In-process corpus build failed
    #[error("corpus build failed: {0}")]
    Wikitext(#[from] wikitext::WikitextError),

    /// Blocking task was cancelled or panicked
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Configuration file could not be parsed
    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn in_step(self, lang: &str, step: Step) -> Self {
        Self::Step {
            lang: lang.to_string(),
            step,
            source: Box::new(self),
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
