//! `wiki-prep status`: completion markers per language

use anyhow::Result;
use console::style;

use wiki_prep::pipeline::status;
use wiki_prep::Layout;

use crate::context::AppContext;
use crate::utils::format_bytes;

pub fn print_status(ctx: &AppContext) -> Result<()> {
    let layout = Layout::new(ctx.config.pipeline.root.clone());
    let languages = ctx.config.languages()?;

    ctx.print_header(&format!("Status of {}", layout.root().display()));
    let tool = if layout.tool_dir().exists() {
        style("installed").green()
    } else {
        style("not installed").yellow()
    };
    println!("{:<10} {}", "extractor", tool);
    println!();
    println!("{:<6} {:<22} {:<10} {:<8} next run", "lang", "dump", "extracted", "dataset");

    for entry in status(&layout, &languages, ctx.config.dataset.uses_builtin()) {
        let dump = match (entry.dump, entry.partial_dump) {
            (Some(0), _) => style(format!("{:<22}", "empty")).red(),
            (Some(len), _) => style(format!("{:<22}", format_bytes(len))).green(),
            (None, Some(len)) => {
                style(format!("{:<22}", format!("partial {}", format_bytes(len)))).yellow()
            }
            (None, None) => style(format!("{:<22}", "-")).dim(),
        };
        let yes_no = |b: bool, width: usize| {
            if b {
                style(format!("{:<width$}", "yes")).green()
            } else {
                style(format!("{:<width$}", "no")).dim()
            }
        };
        let pending: Vec<String> = entry.pending_steps().iter().map(|s| s.to_string()).collect();

        println!(
            "{:<6} {} {} {} {}",
            entry.lang.as_str(),
            dump,
            yes_no(entry.extracted, 10),
            match entry.dataset {
                Some(built) => yes_no(built, 8),
                None => style(format!("{:<8}", "unknown")).dim(),
            },
            pending.join(", ")
        );
    }
    Ok(())
}
