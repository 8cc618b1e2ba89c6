//! HTTP and WebSocket routes.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /ws/alerts` | [`ws::ws_alerts`] |
//! | `GET /api/stats` | [`stats::stats`] |
//! | `GET /api/events` | [`stats::events`] |
//! | `GET /health` | [`health::check`] |

pub mod health;
pub mod stats;
pub mod ws;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the daemon router with all routes and layers attached.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws/alerts", get(ws::ws_alerts))
        .route("/api/stats", get(stats::stats))
        .route("/api/events", get(stats::events))
        .route("/health", get(health::check))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Error returned by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Stats file could not be read.
    Stats(String),
    /// Blocking task panicked or was cancelled.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Stats(msg) => {
                tracing::error!(error = %msg, "stats query failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to read alert file")
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<webwatch_detect::DetectError> for ApiError {
    fn from(err: webwatch_detect::DetectError) -> Self {
        ApiError::Stats(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
