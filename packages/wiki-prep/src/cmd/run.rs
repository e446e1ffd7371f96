//! `wiki-prep run`: the full acquisition pipeline

use anyhow::{Context, Result};
use std::path::PathBuf;

use wiki_prep::{Pipeline, ProcessSteps, StepOutcome};

use crate::context::AppContext;

/// Command-line overrides for the configured pipeline.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub root: Option<PathBuf>,
    pub languages: Vec<String>,
    pub max_tokens: Option<u64>,
}

pub async fn run(ctx: &mut AppContext, overrides: RunOverrides) -> Result<()> {
    apply_overrides(ctx, overrides);

    let steps = ProcessSteps::from_config(&ctx.config)?;
    let pipeline = Pipeline::from_config(&ctx.config, steps)?;

    ctx.print_header(&format!(
        "Preparing {} Wikipedia corpora in {}",
        pipeline.languages().len(),
        pipeline.layout().root().display()
    ));

    let report = pipeline.run().await.context("pipeline failed")?;

    for lang in &report.languages {
        let mark = |outcome: StepOutcome| if outcome.ran() { "ran" } else { "skipped" };
        ctx.print_info(&format!(
            "{:<6} fetch {:<8} extract {:<8} build {}",
            lang.lang.as_str(),
            mark(lang.fetch),
            mark(lang.extract),
            mark(lang.build)
        ));
    }
    ctx.print_success(&format!(
        "Done. Corpus in {}",
        pipeline.layout().dataset_dir().display()
    ));
    Ok(())
}

pub fn apply_overrides(ctx: &mut AppContext, overrides: RunOverrides) {
    if let Some(root) = overrides.root {
        ctx.config.pipeline.root = root;
    }
    if !overrides.languages.is_empty() {
        ctx.config.pipeline.languages = overrides.languages;
    }
    if let Some(max_tokens) = overrides.max_tokens {
        ctx.config.pipeline.max_tokens = max_tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiki_prep::Config;

    #[test]
    fn test_overrides_replace_only_given_values() {
        let mut ctx = AppContext {
            quiet: true,
            config: Config::default(),
        };
        apply_overrides(
            &mut ctx,
            RunOverrides {
                root: Some(PathBuf::from("/tmp/corpus")),
                languages: vec!["sv".to_string()],
                max_tokens: None,
            },
        );
        assert_eq!(ctx.config.pipeline.root, PathBuf::from("/tmp/corpus"));
        assert_eq!(ctx.config.pipeline.languages, vec!["sv"]);
        assert_eq!(ctx.config.pipeline.max_tokens, 100_000_000);
    }
}
