//! Streaming reader over WikiExtractor `--json` output.
//!
//! The extractor writes `<root>/AA/wiki_00`, `<root>/AA/wiki_01`, ...,
//! `<root>/AB/wiki_00`, one JSON object per line. Directories and files are
//! visited in name order so repeated builds see the same article sequence.

use serde::Deserialize;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, WikitextError};

/// A single extracted article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Article {
    pub title: String,
    pub text: String,
}

impl Article {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }

    /// True when the extractor emitted nothing but the title.
    pub fn is_title_only(&self) -> bool {
        self.text.trim() == self.title
    }
}

/// List extractor files under `root`, sorted by directory then file name.
pub fn list_extracted_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(WikitextError::MissingInput(root.to_path_buf()));
    }

    let mut dirs = sorted_entries(root)?;
    dirs.retain(|p| p.is_dir());

    let mut files = Vec::new();
    for dir in dirs {
        let mut entries = sorted_entries(&dir)?;
        entries.retain(|p| p.is_file());
        files.extend(entries);
    }
    Ok(files)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| WikitextError::io(dir, e))? {
        let entry = entry.map_err(|e| WikitextError::io(dir, e))?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// Iterate the articles under `root`, skipping title-only records.
pub fn read_articles(root: &Path) -> Result<ArticleReader> {
    let files = list_extracted_files(root)?;
    debug!(root = %root.display(), files = files.len(), "reading extracted articles");
    Ok(ArticleReader {
        files: files.into(),
        current: None,
    })
}

struct OpenFile {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

/// Lazy article iterator returned by [`read_articles`].
pub struct ArticleReader {
    files: VecDeque<PathBuf>,
    current: Option<OpenFile>,
}

impl ArticleReader {
    fn next_record(&mut self) -> Option<Result<Article>> {
        loop {
            if self.current.is_none() {
                let path = self.files.pop_front()?;
                let file = match File::open(&path) {
                    Ok(file) => file,
                    Err(e) => return Some(Err(WikitextError::io(path, e))),
                };
                self.current = Some(OpenFile {
                    path,
                    lines: BufReader::new(file).lines(),
                    line_no: 0,
                });
            }
            let open = self.current.as_mut()?;

            let line = match open.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Some(Err(WikitextError::io(open.path.clone(), e))),
                None => {
                    self.current = None;
                    continue;
                }
            };
            open.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            return Some(
                serde_json::from_str::<Article>(&line).map_err(|source| WikitextError::Json {
                    path: open.path.clone(),
                    line: open.line_no,
                    source,
                }),
            );
        }
    }
}

impl Iterator for ArticleReader {
    type Item = Result<Article>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_record()? {
                Ok(article) if article.is_title_only() => continue,
                other => return Some(other),
            }
        }
    }
}
