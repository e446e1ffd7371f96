//! Token budgeting and split writing.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::article::Article;
use crate::error::{Result, WikitextError};
use crate::tokenizer::{count_tokens, Tokenizer};

/// Articles shorter than this many tokens are left out of the corpus.
pub const MIN_ARTICLE_TOKENS: usize = 100;

/// An article after tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedArticle {
    pub title: String,
    pub paragraphs: Vec<String>,
    /// Non-empty tokens plus one newline per paragraph.
    pub num_tokens: usize,
}

impl TokenizedArticle {
    pub fn is_long_enough(&self) -> bool {
        self.num_tokens >= MIN_ARTICLE_TOKENS
    }
}

pub fn tokenize_article(article: &Article, tokenizer: &dyn Tokenizer) -> TokenizedArticle {
    let mut num_tokens = 0;
    let paragraphs = article
        .text
        .split('\n')
        .map(|paragraph| {
            let tokenized = tokenizer.tokenize(paragraph.trim());
            num_tokens += count_tokens(&tokenized) + 1;
            tokenized
        })
        .collect();

    TokenizedArticle {
        title: article.title.trim().to_string(),
        paragraphs,
        num_tokens,
    }
}

/// Split a total token budget into `[train, valid, test]`.
///
/// Valid and test each get `floor(total * fraction)`, train gets the rest.
pub fn split_budget(total: usize, fraction: f64) -> Result<[usize; 3]> {
    if !(0.0..0.5).contains(&fraction) {
        return Err(WikitextError::InvalidSplit(fraction));
    }
    let held_out = (total as f64 * fraction) as usize;
    Ok([total - 2 * held_out, held_out, held_out])
}

/// Documents and tokens written to one split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitStats {
    pub documents: usize,
    pub tokens: usize,
}

/// Write articles from `articles` to `path` until `budget` tokens are exceeded.
///
/// The article that crosses the budget is still written. Articles are pulled
/// from the shared iterator, so consecutive calls continue where the previous
/// split stopped. A `None` budget drains the iterator.
pub fn write_split<I>(
    path: &Path,
    articles: &mut I,
    tokenizer: &dyn Tokenizer,
    budget: Option<usize>,
) -> Result<SplitStats>
where
    I: Iterator<Item = Result<Article>>,
{
    let file = File::create(path).map_err(|e| WikitextError::io(path, e))?;
    let mut out = BufWriter::new(file);
    let mut stats = SplitStats::default();

    for article in articles.by_ref() {
        let article = tokenize_article(&article?, tokenizer);
        if !article.is_long_enough() {
            continue;
        }

        write_article(&mut out, &article).map_err(|e| WikitextError::io(path, e))?;
        stats.documents += 1;
        stats.tokens += article.num_tokens + 1;

        if budget.is_some_and(|b| stats.tokens > b) {
            break;
        }
    }

    out.flush().map_err(|e| WikitextError::io(path, e))?;
    Ok(stats)
}

fn write_article(out: &mut impl Write, article: &TokenizedArticle) -> std::io::Result<()> {
    writeln!(out, "= {} =", article.title)?;
    for paragraph in &article.paragraphs {
        writeln!(out, "{}", paragraph)?;
    }
    Ok(())
}

/// Total tokens over every article that would be written.
pub fn count_corpus_tokens<I>(articles: I, tokenizer: &dyn Tokenizer) -> Result<usize>
where
    I: Iterator<Item = Result<Article>>,
{
    let mut total = 0;
    for article in articles {
        let article = tokenize_article(&article?, tokenizer);
        if article.is_long_enough() {
            total += article.num_tokens + 1;
        }
    }
    Ok(total)
}

/// Number of distinct whitespace-separated tokens in a file.
pub fn count_unique(path: &Path) -> Result<usize> {
    let file = File::open(path).map_err(|e| WikitextError::io(path, e))?;
    let mut seen = HashSet::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| WikitextError::io(path, e))?;
        for token in line.split_whitespace() {
            if !seen.contains(token) {
                seen.insert(token.to_string());
            }
        }
    }
    Ok(seen.len())
}
