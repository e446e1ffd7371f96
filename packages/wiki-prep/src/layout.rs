//! Deterministic on-disk layout, derived from a root directory and language code.
//!
//! ```text
//! <root>/wiki_dumps/<lang>wiki-latest-pages-articles.xml.bz2
//! <root>/wiki_extr/<lang>/
//! <root>/wiki/
//! <root>/wikiextractor/
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PipelineError, Result};

pub const DEFAULT_DUMP_URL_TEMPLATE: &str =
    "https://dumps.wikimedia.org/{lang}wiki/latest/{lang}wiki-latest-pages-articles.xml.bz2";

/// Suffix of an in-progress download next to its final archive path.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Suffix of the file holding the `ETag` or `Last-Modified` value the partial
/// download was started against.
pub const VALIDATOR_SUFFIX: &str = ".part.validator";

/// A Wikipedia edition identifier such as `de` or `zh-min-nan`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        let valid = !code.is_empty()
            && code.len() <= 16
            && code
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid {
            return Err(PipelineError::InvalidLanguage(code));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LanguageCode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Substitute the language code into a dump URL template.
pub fn dump_url(template: &str, lang: &LanguageCode) -> String {
    template.replace("{lang}", lang.as_str())
}

/// Path construction for one pipeline root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dumps_dir(&self) -> PathBuf {
        self.root.join("wiki_dumps")
    }

    pub fn dump_file_name(lang: &LanguageCode) -> String {
        format!("{lang}wiki-latest-pages-articles.xml.bz2")
    }

    pub fn dump_path(&self, lang: &LanguageCode) -> PathBuf {
        self.dumps_dir().join(Self::dump_file_name(lang))
    }

    pub fn partial_dump_path(&self, lang: &LanguageCode) -> PathBuf {
        partial_path(&self.dump_path(lang))
    }

    pub fn extraction_root(&self) -> PathBuf {
        self.root.join("wiki_extr")
    }

    pub fn extraction_dir(&self, lang: &LanguageCode) -> PathBuf {
        self.extraction_root().join(lang.as_str())
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.root.join("wiki")
    }

    /// Shared extractor checkout; one per root, not per language.
    pub fn tool_dir(&self) -> PathBuf {
        self.root.join("wikiextractor")
    }

    /// Create the fixed directory tree. Existing directories are left alone.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.dumps_dir(), self.extraction_root(), self.dataset_dir()] {
            fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        }
        Ok(())
    }
}

/// `<path>.part`
pub fn partial_path(path: &Path) -> PathBuf {
    with_suffix(path, PARTIAL_SUFFIX)
}

/// `<path>.part.validator`
pub fn validator_path(path: &Path) -> PathBuf {
    with_suffix(path, VALIDATOR_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
