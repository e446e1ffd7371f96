//! Word tokenization for corpus output.

use regex::Regex;

/// Splits a paragraph into tokens and rejoins them with single spaces.
pub trait Tokenizer {
    fn tokenize(&self, paragraph: &str) -> String;
}

/// Moses-style tokenizer: punctuation is split off words, while numbers with
/// separators (`3.14`, `1,000`) and words with inner apostrophes or hyphens
/// (`l'homme`, `state-of-the-art`) stay whole.
#[derive(Debug, Clone)]
pub struct PunctTokenizer {
    pattern: Regex,
}

const TOKEN_PATTERN: &str = r"\d+(?:[.,]\d+)*|\w+(?:['’\-]\w+)*|[^\w\s]";

impl Default for PunctTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PunctTokenizer {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(TOKEN_PATTERN).expect("Failed to compile token pattern"),
        }
    }
}

impl Tokenizer for PunctTokenizer {
    fn tokenize(&self, paragraph: &str) -> String {
        let mut out = String::with_capacity(paragraph.len() + paragraph.len() / 4);
        for m in self.pattern.find_iter(paragraph) {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(m.as_str());
        }
        out
    }
}

/// Whitespace-only tokenizer, for corpora that are already tokenized.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, paragraph: &str) -> String {
        paragraph.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Count non-empty space-separated tokens.
pub fn count_tokens(tokenized: &str) -> usize {
    tokenized.split(' ').filter(|t| !t.is_empty()).count()
}
