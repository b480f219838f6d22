use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lexicover::cli::{AppContext, Cli, Commands};

fn main() -> Result<()> {
    // LEXICOVER_LOG=debug lxv ... for engine tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LEXICOVER_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
    };

    match cli.command {
        Commands::Cover(args) => lexicover::cover_run(args, &ctx),
        Commands::Filter(args) => lexicover::filter_run(args, &ctx),
        Commands::Batch(args) => lexicover::batch_run(args, &ctx),
        Commands::Init(args) => lexicover::infra::config_init(args, &ctx),
        Commands::Completions(args) => lexicover::completion::run(args),
    }
}
