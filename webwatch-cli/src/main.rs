//! webwatch CLI -- bulk scan, stats query and configuration tooling.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use webwatch_cli::cli::{Cli, Commands};
use webwatch_cli::commands;
use webwatch_cli::error::CliError;
use webwatch_cli::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // logs go to stderr so JSON output on stdout stays parseable
    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = %cli.config.display(), "webwatch starting");

    if let Err(err) = run(cli).await {
        use colored::Colorize;
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, &cli.config, &writer).await,
        Commands::Stats(args) => commands::stats::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
