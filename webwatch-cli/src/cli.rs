//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// webwatch -- web request attack detection.
///
/// Use `webwatch <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "webwatch", version, about, long_about = None)]
pub struct Cli {
    /// Path to the webwatch.toml configuration file.
    #[arg(short, long, default_value = "webwatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify every event in a JSON array / JSONL file and save the results.
    Scan(ScanArgs),

    /// Summarize a saved line-delimited result file.
    Stats(StatsArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Run a one-shot bulk scan over a log file.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Input file (JSON array or JSONL). Looked up under the payload
    /// directory when the path does not exist as given.
    pub path: PathBuf,

    /// Expected category of every record (benign, sqli, xss, cmdi, broken_auth).
    ///
    /// Records predicted otherwise are saved to `misclassified_<category>.jsonl`.
    #[arg(long)]
    pub expect: Option<String>,

    /// Minimum severity score (0-100) for an event to appear in the report.
    #[arg(long, default_value_t = 40)]
    pub min_severity: u8,

    /// Maximum number of events listed in the report.
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}

// ---- stats ----

/// Summarize a saved result file.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Result file (default: `stats.alert_file` from the configuration).
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Number of most recent events to list.
    #[arg(long)]
    pub limit: Option<usize>,
}

// ---- config ----

/// Manage webwatch configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, classifier, server, batch, stats, metrics).
        #[arg(long)]
        section: Option<String>,
    },
}
