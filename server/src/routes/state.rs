//! Sync-state endpoint routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::handlers::{
    handle_clear, handle_get_entry, handle_mark_synced, handle_put_entry, handle_summary, now_ms,
    SyncSummary,
};
use crate::AppState;

/// Create sync-state routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync-state", get(summary_handler).delete(clear_handler))
        .route("/sync-state/{name}", get(get_entry_handler).put(put_entry_handler))
        .route("/sync/mark-synced", post(mark_synced_handler))
}

/// GET /sync-state - Pending count, last sync time and all entries.
async fn summary_handler(State(state): State<AppState>) -> Result<Json<SyncSummary>> {
    Ok(Json(handle_summary(&state)?))
}

/// DELETE /sync-state - Remove every entry.
async fn clear_handler(State(state): State<AppState>) -> Result<StatusCode> {
    handle_clear(&state)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /sync-state/{name} - Read one entry.
async fn get_entry_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Map<String, Value>>> {
    Ok(Json(handle_get_entry(&state, &name)?))
}

/// PUT /sync-state/{name} - Replace one entry.
async fn put_entry_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(fields): Json<Value>,
) -> Result<Json<Map<String, Value>>> {
    Ok(Json(handle_put_entry(&state, &name, fields, now_ms())?))
}

/// POST /sync/mark-synced - Record a completed sync.
async fn mark_synced_handler(State(state): State<AppState>) -> Result<Json<Map<String, Value>>> {
    Ok(Json(handle_mark_synced(&state, now_ms())?))
}
