//! Stats handlers over the persisted line-delimited result file.
//!
//! The file is re-read on every request because the batch CLI replaces it
//! wholesale between runs.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use webwatch_detect::stats::{self, EventRow, StatsSummary};

use super::ApiError;
use crate::state::AppState;

/// Query string of `GET /api/events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

/// `GET /api/stats`
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsSummary>, ApiError> {
    let path = state.alert_file();
    let read_limit = state.detect.read_limit;

    let summary = tokio::task::spawn_blocking(move || {
        let rows = stats::read_recent(&path, read_limit)?;
        Ok::<_, ApiError>(stats::summarize(&path, &rows))
    })
    .await??;

    Ok(Json(summary))
}

/// `GET /api/events?limit=N`
pub async fn events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventRow>>, ApiError> {
    let path = state.alert_file();
    let read_limit = state.detect.read_limit;
    let limit = stats::clamp_limit(query.limit, &state.detect);

    let rows = tokio::task::spawn_blocking(move || {
        let rows = stats::read_recent(&path, read_limit)?;
        Ok::<_, ApiError>(stats::recent_events(rows, limit))
    })
    .await??;

    tracing::debug!(requested = ?query.limit, limit, returned = rows.len(), "events served");
    Ok(Json(rows))
}
