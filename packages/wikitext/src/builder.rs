//! End-to-end corpus build: extractor output in, `<lang>.wiki.*.tokens` out.

use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::article::read_articles;
use crate::corpus::{count_corpus_tokens, count_unique, split_budget, write_split, SplitStats};
use crate::error::{Result, WikitextError};
use crate::tokenizer::{PunctTokenizer, Tokenizer};

/// Fraction of the token budget given to each of the valid and test splits.
pub const HELD_OUT_FRACTION: f64 = 0.1;

/// Output splits, in the order they are filled.
pub const SPLITS: [&str; 3] = ["train", "valid", "test"];

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// WikiExtractor output directory (contains `AA/`, `AB/`, ...)
    pub input: PathBuf,
    /// Corpus destination; files go to `<output>/<lang>/`
    pub output: PathBuf,
    pub lang: String,
    /// Total token budget across all splits. `None` means use the whole input.
    pub max_tokens: Option<usize>,
}

impl BuildOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, lang: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            lang: lang.into(),
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn lang_dir(&self) -> PathBuf {
        self.output.join(&self.lang)
    }

    pub fn split_path(&self, split: &str) -> PathBuf {
        self.lang_dir()
            .join(format!("{}.wiki.{}.tokens", self.lang, split))
    }
}

/// Result of writing one split file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    pub name: &'static str,
    pub path: PathBuf,
    pub budget: usize,
    pub stats: SplitStats,
    pub unique_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub total_budget: usize,
    pub splits: Vec<SplitReport>,
}

impl BuildSummary {
    pub fn split(&self, name: &str) -> Option<&SplitReport> {
        self.splits.iter().find(|s| s.name == name)
    }
}

/// Build the corpus with the default tokenizer.
pub fn build(options: &BuildOptions) -> Result<BuildSummary> {
    build_with(options, &PunctTokenizer::new())
}

pub fn build_with(options: &BuildOptions, tokenizer: &dyn Tokenizer) -> Result<BuildSummary> {
    if !options.input.is_dir() {
        return Err(WikitextError::MissingInput(options.input.clone()));
    }

    let total_budget = match options.max_tokens {
        Some(n) => n,
        None => {
            info!(input = %options.input.display(), "counting tokens in extracted articles");
            count_corpus_tokens(read_articles(&options.input)?, tokenizer)?
        }
    };

    let budgets = split_budget(total_budget, HELD_OUT_FRACTION)?;
    info!(
        train = budgets[0],
        valid = budgets[1],
        test = budgets[2],
        "using split budgets"
    );

    let lang_dir = options.lang_dir();
    fs::create_dir_all(&lang_dir).map_err(|e| WikitextError::io(&lang_dir, e))?;

    let mut articles = read_articles(&options.input)?;
    let mut splits = Vec::with_capacity(SPLITS.len());

    for (name, budget) in SPLITS.into_iter().zip(budgets) {
        let path = options.split_path(name);
        let stats = write_split(&path, &mut articles, tokenizer, Some(budget))?;
        info!(
            path = %path.display(),
            documents = stats.documents,
            tokens = stats.tokens,
            "wrote split"
        );
        splits.push((name, path, budget, stats));
    }

    let splits = splits
        .into_iter()
        .map(|(name, path, budget, stats)| {
            let unique_tokens = count_unique(&path)?;
            info!(path = %path.display(), unique_tokens, "unique tokens");
            Ok(SplitReport {
                name,
                path,
                budget,
                stats,
                unique_tokens,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BuildSummary {
        total_budget,
        splits,
    })
}

/// True when every split file for `options` already exists.
pub fn is_built(options: &BuildOptions) -> bool {
    SPLITS.into_iter().all(|split| options.split_path(split).exists())
}
