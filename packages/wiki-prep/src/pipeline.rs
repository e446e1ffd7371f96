//! Pipeline driver.
//!
//! For every language, in order:
//!
//! 1. fetch the dump unless the archive path exists
//! 2. install the extractor unless the shared tool directory exists
//! 3. extract unless the per-language output directory exists
//! 4. build the dataset (always)
//!
//! Completion is judged by path presence only. A zero-byte archive counts as
//! fetched; an extraction directory left behind by a crashed extractor counts
//! as extracted. Steps run one at a time and the first failure ends the run.

use std::fs;
use std::path::PathBuf;
use tracing::{info, info_span, Instrument};

use crate::config::Config;
use crate::error::{Result, Step};
use crate::layout::{dump_url, LanguageCode, Layout, DEFAULT_DUMP_URL_TEMPLATE};
use crate::steps::PipelineSteps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Ran,
    Skipped,
}

impl StepOutcome {
    pub fn ran(self) -> bool {
        self == StepOutcome::Ran
    }
}

/// What happened for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageReport {
    pub lang: LanguageCode,
    pub fetch: StepOutcome,
    pub install: StepOutcome,
    pub extract: StepOutcome,
    pub build: StepOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub languages: Vec<LanguageReport>,
}

impl RunReport {
    pub fn count(&self, step: Step) -> usize {
        self.languages
            .iter()
            .filter(|r| {
                let outcome = match step {
                    Step::Fetch => r.fetch,
                    Step::Install => r.install,
                    Step::Extract => r.extract,
                    Step::Build => r.build,
                };
                outcome.ran()
            })
            .count()
    }
}

/// Completion markers for one language, as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageStatus {
    pub lang: LanguageCode,
    pub dump: Option<u64>,
    pub partial_dump: Option<u64>,
    pub extracted: bool,
    /// Split files of the built-in formatter are all present. `None` when a
    /// custom formatter is configured, whose outputs are unknown.
    pub dataset: Option<bool>,
}

impl LanguageStatus {
    /// Steps the next run would perform for this language, ignoring the
    /// shared extractor install.
    pub fn pending_steps(&self) -> Vec<Step> {
        let mut steps = Vec::new();
        if self.dump.is_none() {
            steps.push(Step::Fetch);
        }
        if !self.extracted {
            steps.push(Step::Extract);
        }
        steps.push(Step::Build);
        steps
    }
}

pub struct Pipeline<S> {
    layout: Layout,
    languages: Vec<LanguageCode>,
    url_template: String,
    max_tokens: u64,
    builtin_formatter: bool,
    steps: S,
}

impl<S: PipelineSteps> Pipeline<S> {
    pub fn new(layout: Layout, languages: Vec<LanguageCode>, steps: S) -> Self {
        Self {
            layout,
            languages,
            url_template: DEFAULT_DUMP_URL_TEMPLATE.to_string(),
            max_tokens: Config::default().pipeline.max_tokens,
            builtin_formatter: true,
            steps,
        }
    }

    pub fn from_config(config: &Config, steps: S) -> Result<Self> {
        Ok(Self::new(
            Layout::new(config.pipeline.root.clone()),
            config.languages()?,
            steps,
        )
        .with_url_template(config.dump.url_template.clone())
        .with_max_tokens(config.pipeline.max_tokens)
        .with_builtin_formatter(config.dataset.uses_builtin()))
    }

    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Whether the build step writes the `wikitext` split files that
    /// [`status`] looks for.
    pub fn with_builtin_formatter(mut self, builtin: bool) -> Self {
        self.builtin_formatter = builtin;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn languages(&self) -> &[LanguageCode] {
        &self.languages
    }

    /// Run every language in order, stopping at the first failure.
    pub async fn run(&self) -> Result<RunReport> {
        self.layout.ensure_dirs()?;
        info!(
            root = %self.layout.root().display(),
            languages = self.languages.len(),
            "starting pipeline"
        );

        let mut report = RunReport::default();
        for lang in &self.languages {
            let span = info_span!("lang", lang = %lang);
            let lang_report = self.run_language(lang).instrument(span).await?;
            report.languages.push(lang_report);
        }

        info!(
            fetched = report.count(Step::Fetch),
            extracted = report.count(Step::Extract),
            built = report.count(Step::Build),
            "pipeline finished"
        );
        Ok(report)
    }

    async fn run_language(&self, lang: &LanguageCode) -> Result<LanguageReport> {
        let dump = self.layout.dump_path(lang);
        let fetch = if dump.exists() {
            info!(path = %dump.display(), "dump present, skipping fetch");
            StepOutcome::Skipped
        } else {
            let url = dump_url(&self.url_template, lang);
            info!(url = %url, "fetching dump");
            self.steps
                .fetch_dump(&url, &dump)
                .await
                .map_err(|e| e.in_step(lang.as_str(), Step::Fetch))?;
            StepOutcome::Ran
        };

        let tool_dir = self.layout.tool_dir();
        let install = if tool_dir.exists() {
            StepOutcome::Skipped
        } else {
            info!(path = %tool_dir.display(), "installing extractor");
            self.steps
                .install_extractor(&tool_dir)
                .await
                .map_err(|e| e.in_step(lang.as_str(), Step::Install))?;
            StepOutcome::Ran
        };

        let out_dir = self.layout.extraction_dir(lang);
        let extract = if out_dir.exists() {
            info!(path = %out_dir.display(), "extraction present, skipping extract");
            StepOutcome::Skipped
        } else {
            info!(dump = %dump.display(), out = %out_dir.display(), "extracting articles");
            self.steps
                .extract(&tool_dir, &dump, &out_dir)
                .await
                .map_err(|e| e.in_step(lang.as_str(), Step::Extract))?;
            StepOutcome::Ran
        };

        let dataset_dir = self.layout.dataset_dir();
        info!(out = %dataset_dir.display(), max_tokens = self.max_tokens, "building dataset");
        self.steps
            .build_dataset(&out_dir, lang, &dataset_dir, self.max_tokens)
            .await
            .map_err(|e| e.in_step(lang.as_str(), Step::Build))?;

        Ok(LanguageReport {
            lang: lang.clone(),
            fetch,
            install,
            extract,
            build: StepOutcome::Ran,
        })
    }

    pub fn status(&self) -> Vec<LanguageStatus> {
        status(&self.layout, &self.languages, self.builtin_formatter)
    }
}

/// Inspect completion markers without running anything.
///
/// Dataset completion is only checked when `builtin_formatter` is set.
pub fn status(
    layout: &Layout,
    languages: &[LanguageCode],
    builtin_formatter: bool,
) -> Vec<LanguageStatus> {
    let dataset_dir = layout.dataset_dir();
    languages
        .iter()
        .map(|lang| LanguageStatus {
            lang: lang.clone(),
            dump: file_len(layout.dump_path(lang)),
            partial_dump: file_len(layout.partial_dump_path(lang)),
            extracted: layout.extraction_dir(lang).exists(),
            dataset: builtin_formatter.then(|| {
                wikitext::is_built(&wikitext::BuildOptions::new(
                    layout.extraction_dir(lang),
                    &dataset_dir,
                    lang.as_str(),
                ))
            }),
        })
        .collect()
}

fn file_len(path: PathBuf) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}
