//! Command implementations

pub mod run;
pub mod status;
pub mod wikitext;

use anyhow::{anyhow, Result};
use console::style;

use wiki_prep::cmd_builder::CmdBuilder;

use crate::context::AppContext;
use crate::utils::cmd_exists;

/// Print doctor/health check information
pub fn print_doctor(ctx: &AppContext) -> Result<()> {
    let python = ctx.config.extractor.python.as_str();
    let checks: &[(&str, &str)] = &[("git", "git"), ("python", python)];

    ctx.print_header("Doctor");
    if !ctx.quiet {
        println!("Root: {}", ctx.config.pipeline.root.display());
        println!("Languages: {}", ctx.config.pipeline.languages.join(", "));
        println!();
    }

    let mut missing = Vec::new();
    for (label, bin) in checks {
        let status = if cmd_exists(bin) {
            let version = CmdBuilder::new(*bin)
                .arg("--version")
                .run_capture()
                .ok()
                .and_then(|out| out.first_line())
                .unwrap_or_default();
            format!("{} {}", style("OK").green(), style(version).dim())
        } else {
            missing.push(*bin);
            style("MISSING").yellow().to_string()
        };
        println!("{:<16} {}", label, status);
    }

    if let Err(e) = ctx.config.languages() {
        println!("{:<16} {}", "languages", style(e).red());
        return Err(anyhow!("configuration has invalid language codes"));
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("missing required tools: {}", missing.join(", ")))
    }
}
