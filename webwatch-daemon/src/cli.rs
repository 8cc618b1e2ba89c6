//! CLI argument definitions for webwatch-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// webwatch live detection daemon.
///
/// Accepts raw request events over a WebSocket channel, turns each one
/// into an alert and fans it out to every other connected client. Also
/// serves summary statistics over the persisted result file.
#[derive(Parser, Debug)]
#[command(name = "webwatch-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to webwatch.toml configuration file.
    #[arg(short, long, default_value = "webwatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override HTTP/WebSocket bind address (e.g. 127.0.0.1:8000).
    #[arg(long)]
    pub bind: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut webwatch_core::config::WebwatchConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
        if let Some(bind) = &self.bind {
            config.server.bind_addr = bind.clone();
        }
    }
}
