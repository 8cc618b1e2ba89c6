//! Daemon assembly and lifecycle.
//!
//! The [`Server`] is the composition root of `webwatch-daemon`. It validates
//! configuration, installs the metrics recorder, creates the single shared
//! classifier handle, wires the assembler into the broadcast hub and serves
//! the router until a shutdown signal arrives.
//!
//! # Startup Order
//!
//! 1. Validate configuration (core + derived detect settings)
//! 2. Install Prometheus recorder (when `metrics.enabled`)
//! 3. Create the classifier handle and try an early model load
//! 4. Build assembler -> hub -> router
//! 5. Bind and serve until SIGTERM/SIGINT

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use webwatch_core::config::WebwatchConfig;
use webwatch_detect::{AlertAssembler, AlertBroadcastHub, ClassifierClient, DetectConfig};

use crate::handlers;
use crate::metrics_server;
use crate::state::AppState;

/// The live detection server.
pub struct Server {
    /// Loaded and validated configuration.
    config: WebwatchConfig,
    /// Shared handler state.
    state: AppState,
    /// Cancelled when the server should stop accepting connections.
    shutdown: CancellationToken,
}

impl Server {
    /// Load configuration and build the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read, parsed or validated.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = WebwatchConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    pub fn build_from_config(config: WebwatchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let detect = DetectConfig::from_core(&config);
        detect
            .validate()
            .map_err(|e| anyhow::anyhow!("detect config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
        }

        let classifier = Arc::new(ClassifierClient::from_config(&detect));
        // A failed early load is not fatal: the handle retries on first use.
        match classifier.warm_up() {
            Ok(()) => tracing::info!(model = %detect.model_path, "classifier ready"),
            Err(e) => tracing::warn!(
                model = %detect.model_path,
                error = %e,
                "classifier model not loaded at startup, will retry on first event"
            ),
        }

        let assembler = AlertAssembler::new(classifier)
            .map_err(|e| anyhow::anyhow!("failed to build alert assembler: {}", e))?;
        let hub = AlertBroadcastHub::new(assembler, &detect);
        let state = AppState::new(hub, detect);

        tracing::info!(
            bind_addr = %config.server.bind_addr,
            alert_file = %state.detect.alert_file,
            echo_to_sender = config.server.echo_to_sender,
            "server initialized"
        );

        Ok(Self {
            config,
            state,
            shutdown: CancellationToken::new(),
        })
    }

    /// Shared handler state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &WebwatchConfig {
        &self.config
    }

    /// Router with all routes and layers.
    pub fn router(&self) -> Router {
        handlers::create_router(self.state.clone())
    }

    /// Token that stops [`serve`](Self::serve) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.server.bind_addr.as_str())
            .await
            .map_err(|e| {
                anyhow::anyhow!("failed to bind {}: {}", self.config.server.bind_addr, e)
            })?;

        let token = self.shutdown_token();
        let signal_task = tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(signal) => tracing::info!(signal = signal, "shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "signal handling failed, shutting down"),
            }
            token.cancel();
        });

        let result = self.serve(listener).await;
        signal_task.abort();
        result
    }

    /// Serve on an already-bound listener until the shutdown token is cancelled.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(listen_addr = %addr, "webwatch-daemon listening");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

        tracing::info!("webwatch-daemon stopped");
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("CTRL_C")
}
