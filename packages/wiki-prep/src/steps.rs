//! The external actions behind each pipeline step.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::cmd_builder::CmdBuilder;
use crate::config::{Config, ExtractorConfig};
use crate::download::Downloader;
use crate::error::{PipelineError, Result};
use crate::layout::LanguageCode;

/// Actions the pipeline driver sequences.
///
/// Implementations perform the work unconditionally; deciding whether a step
/// is needed is the driver's job.
#[async_trait]
pub trait PipelineSteps: Send + Sync {
    /// Download `url` so that `dest` exists afterwards.
    async fn fetch_dump(&self, url: &str, dest: &Path) -> Result<()>;

    /// Obtain and install the extractor into `tool_dir`.
    async fn install_extractor(&self, tool_dir: &Path) -> Result<()>;

    /// Run the extractor over `dump`, writing records under `out_dir`.
    async fn extract(&self, tool_dir: &Path, dump: &Path, out_dir: &Path) -> Result<()>;

    /// Turn extracted records into the final corpus under `dataset_dir`.
    async fn build_dataset(
        &self,
        extraction_dir: &Path,
        lang: &LanguageCode,
        dataset_dir: &Path,
        max_tokens: u64,
    ) -> Result<()>;
}

/// Production steps: HTTP download, git, python, and the dataset formatter.
pub struct ProcessSteps {
    downloader: Downloader,
    extractor: ExtractorConfig,
    dataset_command: Vec<String>,
}

impl ProcessSteps {
    pub fn new(
        downloader: Downloader,
        extractor: ExtractorConfig,
        dataset_command: Vec<String>,
    ) -> Self {
        Self {
            downloader,
            extractor,
            dataset_command,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let downloader = Downloader::new(
            config.dump.user_agent.clone(),
            Duration::from_secs(config.dump.connect_timeout_secs),
        )?;
        let dataset_command = match &config.dataset.command {
            Some(command) if !command.is_empty() => command.clone(),
            _ => default_dataset_command()?,
        };
        Ok(Self::new(
            downloader,
            config.extractor.clone(),
            dataset_command,
        ))
    }

    fn extract_command(&self, tool_dir: &Path, dump: &Path, out_dir: &Path) -> CmdBuilder {
        CmdBuilder::new(self.extractor.python.clone())
            .arg("-m")
            .arg(self.extractor.module.clone())
            .args(self.extractor.args.iter().cloned())
            .arg("-o")
            .arg(path_arg(out_dir))
            .arg(path_arg(dump))
            .env("PYTHONPATH", python_path(tool_dir))
            .env("PYTHONIOENCODING", "utf-8")
    }

    fn build_command(
        &self,
        extraction_dir: &Path,
        lang: &LanguageCode,
        dataset_dir: &Path,
        max_tokens: u64,
    ) -> Result<CmdBuilder> {
        let cmd = CmdBuilder::from_argv(&self.dataset_command).ok_or_else(|| PipelineError::Spawn {
            command: String::new(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "dataset command is empty",
            ),
        })?;
        Ok(cmd
            .arg("-i")
            .arg(path_arg(extraction_dir))
            .arg("-l")
            .arg(lang.as_str())
            .arg("-o")
            .arg(path_arg(dataset_dir))
            .arg("-t")
            .arg(max_tokens.to_string()))
    }
}

/// `<current exe> wikitext`
fn default_dataset_command() -> Result<Vec<String>> {
    let exe = std::env::current_exe().map_err(|e| PipelineError::io("<current exe>", e))?;
    Ok(vec![path_arg(&exe), "wikitext".to_string()])
}

/// `tool_dir` ahead of any inherited `PYTHONPATH`.
fn python_path(tool_dir: &Path) -> String {
    let mut paths = vec![tool_dir.to_path_buf()];
    if let Some(existing) = std::env::var_os("PYTHONPATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    match std::env::join_paths(paths) {
        Ok(joined) => joined.to_string_lossy().into_owned(),
        Err(_) => path_arg(tool_dir),
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[async_trait]
impl PipelineSteps for ProcessSteps {
    async fn fetch_dump(&self, url: &str, dest: &Path) -> Result<()> {
        self.downloader.fetch(url, dest).await?;
        Ok(())
    }

    async fn install_extractor(&self, tool_dir: &Path) -> Result<()> {
        info!(repo = %self.extractor.repo_url, dir = %tool_dir.display(), "cloning extractor");
        CmdBuilder::new("git")
            .args(["clone", "--depth", "1"])
            .arg(self.extractor.repo_url.clone())
            .arg(path_arg(tool_dir))
            .run_checked_async()
            .await?;

        if let Some(install) = CmdBuilder::from_argv(&self.extractor.install_command()) {
            info!(command = %install.display(), "installing extractor");
            install.cwd(tool_dir.to_path_buf()).run_checked_async().await?;
        }
        Ok(())
    }

    async fn extract(&self, tool_dir: &Path, dump: &Path, out_dir: &Path) -> Result<()> {
        let cmd = self.extract_command(tool_dir, dump, out_dir);
        info!(command = %cmd.display(), "running extractor");
        cmd.run_checked_async().await
    }

    async fn build_dataset(
        &self,
        extraction_dir: &Path,
        lang: &LanguageCode,
        dataset_dir: &Path,
        max_tokens: u64,
    ) -> Result<()> {
        let cmd = self.build_command(extraction_dir, lang, dataset_dir, max_tokens)?;
        info!(command = %cmd.display(), "building dataset");
        cmd.run_checked_async().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(command: Vec<String>) -> ProcessSteps {
        let downloader = Downloader::new("test", Duration::from_secs(1)).unwrap();
        ProcessSteps::new(downloader, ExtractorConfig::default(), command)
    }

    #[test]
    fn test_extract_command() {
        let steps = steps(vec!["fmt".to_string()]);
        let cmd = steps.extract_command(
            Path::new("data/wikiextractor"),
            Path::new("data/wiki_dumps/dewiki.xml.bz2"),
            Path::new("data/wiki_extr/de"),
        );
        assert_eq!(cmd.program(), "python3");
        assert_eq!(
            cmd.display(),
            "python3 -m wikiextractor.WikiExtractor --json -q -b 100M \
             --processes 4 -o data/wiki_extr/de data/wiki_dumps/dewiki.xml.bz2"
        );
        let python_path = cmd.get_env("PYTHONPATH").unwrap();
        assert!(python_path.starts_with("data/wikiextractor"));
        assert_eq!(cmd.get_env("PYTHONIOENCODING"), Some("utf-8"));
    }

    #[test]
    fn test_extract_uses_configured_interpreter_and_module() {
        let extractor = ExtractorConfig {
            python: "python3.11".to_string(),
            module: "wikiextractor.main".to_string(),
            args: vec!["--json".to_string()],
            ..ExtractorConfig::default()
        };
        let downloader = Downloader::new("test", Duration::from_secs(1)).unwrap();
        let steps = ProcessSteps::new(downloader, extractor, vec!["fmt".to_string()]);
        let cmd = steps.extract_command(Path::new("tools"), Path::new("d.xml.bz2"), Path::new("out"));
        assert_eq!(
            cmd.display(),
            "python3.11 -m wikiextractor.main --json -o out d.xml.bz2"
        );
    }

    #[test]
    fn test_build_command_appends_contract_args() {
        let steps = steps(vec!["python3".to_string(), "create_wikitext.py".to_string()]);
        let lang = LanguageCode::new("it").unwrap();
        let cmd = steps
            .build_command(Path::new("data/wiki_extr/it"), &lang, Path::new("data/wiki"), 1000)
            .unwrap();
        assert_eq!(
            cmd.display(),
            "python3 create_wikitext.py -i data/wiki_extr/it -l it -o data/wiki -t 1000"
        );
    }

    #[test]
    fn test_empty_dataset_command_is_an_error() {
        let steps = steps(Vec::new());
        let lang = LanguageCode::new("it").unwrap();
        assert!(steps
            .build_command(Path::new("x"), &lang, Path::new("y"), 1)
            .is_err());
    }
}
