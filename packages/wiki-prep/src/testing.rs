//! Testing utilities including a mock step implementation.
//!
//! [`MockSteps`] records every call and creates the same marker paths the
//! real steps would, so the driver's existence checks behave as in production
//! without network, git or python. Extraction writes one article long enough
//! to survive the minimum-length filter, and the build step runs the real
//! [`wikitext::build`] over it.

use async_trait::async_trait;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{PipelineError, Result};
use crate::layout::LanguageCode;
use crate::steps::PipelineSteps;

/// Record of a call made to the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Fetch { url: String, dest: PathBuf },
    Install { tool_dir: PathBuf },
    Extract { dump: PathBuf, out_dir: PathBuf },
    Build { lang: String, extraction_dir: PathBuf, dataset_dir: PathBuf, max_tokens: u64 },
}

impl MockCall {
    pub fn kind(&self) -> &'static str {
        match self {
            MockCall::Fetch { .. } => "fetch",
            MockCall::Install { .. } => "install",
            MockCall::Extract { .. } => "extract",
            MockCall::Build { .. } => "build",
        }
    }
}

#[derive(Clone, Default)]
pub struct MockSteps {
    calls: Arc<RwLock<Vec<MockCall>>>,
    /// URL substrings whose fetch fails as if the host were unreachable
    unreachable: Arc<RwLock<HashSet<String>>>,
}

impl MockSteps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail fetches whose URL contains `pattern`.
    pub fn with_unreachable(self, pattern: impl Into<String>) -> Self {
        self.unreachable
            .write()
            .expect("mock lock poisoned")
            .insert(pattern.into());
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.read().expect("mock lock poisoned").clone()
    }

    /// Call kinds in order, e.g. `["fetch", "install", "extract", "build"]`.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.calls().iter().map(MockCall::kind).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.calls().iter().filter(|c| c.kind() == kind).count()
    }

    /// Languages passed to the build step, in call order.
    pub fn built_languages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Build { lang, .. } => Some(lang),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.write().expect("mock lock poisoned").clear();
    }

    fn record(&self, call: MockCall) {
        self.calls.write().expect("mock lock poisoned").push(call);
    }
}

#[async_trait]
impl PipelineSteps for MockSteps {
    async fn fetch_dump(&self, url: &str, dest: &Path) -> Result<()> {
        self.record(MockCall::Fetch {
            url: url.to_string(),
            dest: dest.to_path_buf(),
        });

        let unreachable = self
            .unreachable
            .read()
            .expect("mock lock poisoned")
            .iter()
            .any(|p| url.contains(p.as_str()));
        if unreachable {
            return Err(PipelineError::Download {
                url: url.to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "network unreachable",
                )),
            });
        }

        fs::write(dest, b"BZh91AY&SY").map_err(|e| PipelineError::io(dest, e))
    }

    async fn install_extractor(&self, tool_dir: &Path) -> Result<()> {
        self.record(MockCall::Install {
            tool_dir: tool_dir.to_path_buf(),
        });
        fs::create_dir_all(tool_dir).map_err(|e| PipelineError::io(tool_dir, e))
    }

    async fn extract(&self, _tool_dir: &Path, dump: &Path, out_dir: &Path) -> Result<()> {
        self.record(MockCall::Extract {
            dump: dump.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
        });
        let shard = out_dir.join("AA");
        fs::create_dir_all(&shard).map_err(|e| PipelineError::io(&shard, e))?;
        let file = shard.join("wiki_00");
        fs::write(&file, mock_article_record()).map_err(|e| PipelineError::io(&file, e))
    }

    async fn build_dataset(
        &self,
        extraction_dir: &Path,
        lang: &LanguageCode,
        dataset_dir: &Path,
        max_tokens: u64,
    ) -> Result<()> {
        self.record(MockCall::Build {
            lang: lang.to_string(),
            extraction_dir: extraction_dir.to_path_buf(),
            dataset_dir: dataset_dir.to_path_buf(),
            max_tokens,
        });

        let options = wikitext::BuildOptions::new(extraction_dir, dataset_dir, lang.as_str())
            .with_max_tokens(usize::try_from(max_tokens).unwrap_or(usize::MAX));
        wikitext::build(&options)?;
        Ok(())
    }
}

/// Number of body words in the article written by [`MockSteps::extract`].
pub const MOCK_ARTICLE_WORDS: usize = 150;

/// One extractor JSON line: a title paragraph and a body of
/// [`MOCK_ARTICLE_WORDS`] words.
fn mock_article_record() -> String {
    let body = vec!["word"; MOCK_ARTICLE_WORDS].join(" ");
    format!(
        "{{\"id\":\"1\",\"title\":\"Mock\",\"text\":\"Mock\\n{}\"}}\n",
        body
    )
}
