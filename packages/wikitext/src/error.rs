//! Typed errors for the dataset builder.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building a WikiText corpus.
#[derive(Debug, Error)]
pub enum WikitextError {
    /// Extraction output directory is missing
    #[error("input directory does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    /// Filesystem operation failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line in an extractor file was not a valid article record
    #[error("invalid article record at {}:{line}: {source}", path.display())]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Split fraction outside `[0, 0.5)`
    #[error("invalid split fraction: {0}")]
    InvalidSplit(f64),
}

impl WikitextError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for dataset builder operations.
pub type Result<T> = std::result::Result<T, WikitextError>;
