//! Command builder pattern for running external processes

use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Fluent builder for running external commands
#[derive(Debug, Clone, Default)]
pub struct CmdBuilder {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CmdBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Build from `[program, args...]`. Returns `None` for an empty slice.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.cwd = Some(path.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Command line as it would be typed, for logs and errors.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        cmd
    }

    /// Run with inherited stdio and return the exit code.
    pub fn run(&self) -> Result<i32> {
        debug!(command = %self.display(), cwd = ?self.cwd, "running command");
        let status = self
            .build_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| PipelineError::Spawn {
                command: self.display(),
                source,
            })?;
        Ok(status.code().unwrap_or(1))
    }

    /// Run and fail on a non-zero exit code.
    pub fn run_checked(&self) -> Result<()> {
        match self.run()? {
            0 => Ok(()),
            code => Err(PipelineError::CommandFailed {
                command: self.display(),
                code,
            }),
        }
    }

    /// [`run_checked`](Self::run_checked) on the blocking thread pool.
    pub async fn run_checked_async(self) -> Result<()> {
        tokio::task::spawn_blocking(move || self.run_checked()).await?
    }

    /// Run with stdin closed and stdout captured. Fails on a non-zero exit code.
    pub fn run_capture(&self) -> Result<CmdOutput> {
        let output = self
            .build_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| PipelineError::Spawn {
                command: self.display(),
                source,
            })?;

        if !output.status.success() {
            return Err(PipelineError::CommandFailed {
                command: self.display(),
                code: output.status.code().unwrap_or(1),
            });
        }
        Ok(CmdOutput {
            stdout: output.stdout,
        })
    }
}

/// Output from a captured command execution
pub struct CmdOutput {
    pub stdout: Vec<u8>,
}

impl CmdOutput {
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn first_line(&self) -> Option<String> {
        self.stdout_string()
            .lines()
            .map(|l| l.trim().to_string())
            .find(|l| !l.is_empty())
    }
}
