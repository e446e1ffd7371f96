//! Application context with shared state and utilities

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use wiki_prep::Config;

/// Application context passed to all commands
pub struct AppContext {
    pub quiet: bool,
    pub config: Config,
}

impl AppContext {
    pub fn new(quiet: bool, config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_path).context("failed to load configuration")?;
        Ok(Self { quiet, config })
    }

    pub fn print_header(&self, msg: &str) {
        if !self.quiet {
            println!();
            println!("{}", style(msg).bold());
        }
    }

    pub fn print_success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).green());
        }
    }

    pub fn print_warning(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).yellow());
        }
    }

    pub fn print_info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).cyan());
        }
    }
}
