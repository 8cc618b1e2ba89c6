//! Health check handler

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub subscribers: usize,
    pub uptime_secs: u64,
    pub timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        subscribers: state.hub.subscriber_count().await,
        uptime_secs: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
