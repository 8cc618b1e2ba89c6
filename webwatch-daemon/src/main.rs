use anyhow::Result;
use clap::Parser;

use webwatch_core::config::WebwatchConfig;
use webwatch_daemon::cli::DaemonCli;
use webwatch_daemon::logging;
use webwatch_daemon::server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // Precedence: CLI flags > environment > file > defaults
    let mut config = WebwatchConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration is valid: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "webwatch-daemon starting"
    );

    let server = Server::build_from_config(config)?;
    server.run().await?;

    tracing::info!("webwatch-daemon shut down");
    Ok(())
}
