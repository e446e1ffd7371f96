//! wiki-prep: Wikipedia dump download, extraction and corpus build

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cmd;
mod context;
mod utils;

use cmd::run::RunOverrides;
use context::AppContext;

#[derive(Parser)]
#[command(name = "wiki-prep")]
#[command(about = "Download Wikipedia dumps, extract articles and build WikiText corpora")]
#[command(version)]
struct Cli {
    /// Run in quiet mode (logs only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file (default: ./wiki-prep.toml or $WIKI_PREP_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, extract and build every configured language (default)
    Run {
        /// Root directory for dumps, extraction output and corpus
        #[arg(long)]
        root: Option<PathBuf>,

        /// Language codes to process, in order (repeatable)
        #[arg(short, long = "lang")]
        lang: Vec<String>,

        /// Token budget passed to the dataset builder
        #[arg(long)]
        max_tokens: Option<u64>,
    },

    /// Show which steps are complete for each language
    Status {
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Check system prerequisites
    Doctor,

    /// Build a WikiText corpus from WikiExtractor JSON output
    Wikitext {
        /// Directory produced by WikiExtractor (contains AA, AB, ...)
        #[arg(short, long)]
        input: PathBuf,

        /// Language code, used for output file names
        #[arg(short, long)]
        lang: String,

        /// Output directory; files go to <output>/<lang>/
        #[arg(short, long)]
        output: PathBuf,

        /// Total tokens across train/valid/test (default: whole input)
        #[arg(short, long)]
        tokens: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wiki_prep=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut ctx = AppContext::new(cli.quiet, cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run {
        root: None,
        lang: Vec::new(),
        max_tokens: None,
    }) {
        Commands::Run {
            root,
            lang,
            max_tokens,
        } => {
            let overrides = RunOverrides {
                root,
                languages: lang,
                max_tokens,
            };
            cmd::run::run(&mut ctx, overrides).await
        }
        Commands::Status { root } => {
            if let Some(root) = root {
                ctx.config.pipeline.root = root;
            }
            cmd::status::print_status(&ctx)
        }
        Commands::Doctor => cmd::print_doctor(&ctx),
        Commands::Wikitext {
            input,
            lang,
            output,
            tokens,
        } => cmd::wikitext::build(&ctx, input, lang, output, tokens),
    }
}
