//! webwatch daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `webwatch-daemon` is used as a binary (main.rs).

pub mod cli;
pub mod handlers;
pub mod logging;
pub mod metrics_server;
pub mod server;
pub mod state;
