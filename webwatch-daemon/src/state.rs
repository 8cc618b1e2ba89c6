//! Shared application state handed to every request handler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use webwatch_detect::{AlertBroadcastHub, DetectConfig};

/// State shared by the HTTP and WebSocket handlers.
///
/// Cheap to clone; everything behind it is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Alert fan-out hub (owns the assembler and classifier handle).
    pub hub: Arc<AlertBroadcastHub>,
    /// Detection settings (stats file, event limits).
    pub detect: Arc<DetectConfig>,
    /// Daemon start time, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(hub: AlertBroadcastHub, detect: DetectConfig) -> Self {
        Self {
            hub: Arc::new(hub),
            detect: Arc::new(detect),
            started_at: Instant::now(),
        }
    }

    /// Line-delimited result file the stats endpoints read.
    pub fn alert_file(&self) -> PathBuf {
        PathBuf::from(&self.detect.alert_file)
    }
}
