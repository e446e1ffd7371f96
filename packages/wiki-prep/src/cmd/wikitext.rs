//! `wiki-prep wikitext`: the default dataset formatter

use anyhow::{Context, Result};
use std::path::PathBuf;

use wikitext::BuildOptions;

use crate::context::AppContext;

pub fn build(
    ctx: &AppContext,
    input: PathBuf,
    lang: String,
    output: PathBuf,
    tokens: Option<usize>,
) -> Result<()> {
    let mut options = BuildOptions::new(input, output, lang);
    if let Some(tokens) = tokens {
        options = options.with_max_tokens(tokens);
    }

    ctx.print_header(&format!(
        "Building {} corpus from {}",
        options.lang,
        options.input.display()
    ));
    let summary = wikitext::build(&options)
        .with_context(|| format!("failed to build corpus in {}", options.lang_dir().display()))?;

    for split in &summary.splits {
        ctx.print_info(&format!(
            "{:<6} {} documents, {} tokens, {} unique ({})",
            split.name,
            split.stats.documents,
            split.stats.tokens,
            split.unique_tokens,
            split.path.display()
        ));
    }
    if summary.splits.iter().any(|s| s.stats.documents == 0) {
        ctx.print_warning("Some splits are empty; the input may be smaller than the token budget.");
    }
    ctx.print_success("Corpus written.");
    Ok(())
}
