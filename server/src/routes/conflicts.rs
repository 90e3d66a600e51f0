//! Conflict endpoint routes.

use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use vaxsync_engine::{ConflictLogEntry, FieldConflict, ReconcileResult};

use crate::error::Result;
use crate::handlers::{
    handle_clear_log, handle_detect, handle_list_log, handle_reconcile, handle_resolve, now_ms,
    DetectRequest, ReconcileRequest, ResolveRequest, ResolveResponse,
};
use crate::AppState;

/// Create conflict routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/conflicts/detect", post(detect_handler))
        .route("/conflicts/resolve", post(resolve_handler))
        .route("/conflicts/log", get(list_log_handler).delete(clear_log_handler))
        .route("/reconcile", post(reconcile_handler))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

/// POST /conflicts/detect - List disagreements between two records.
async fn detect_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Json<Vec<FieldConflict>> {
    Json(handle_detect(&state, request))
}

/// POST /conflicts/resolve - Resolve two records into one.
async fn resolve_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>> {
    let response = handle_resolve(&state, request, user_agent(&headers), now_ms())?;
    Ok(Json(response))
}

/// POST /reconcile - Reconcile a local and a server dataset.
async fn reconcile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ReconcileRequest>,
) -> Result<Json<ReconcileResult>> {
    let response = handle_reconcile(&state, request, user_agent(&headers), now_ms())?;
    Ok(Json(response))
}

/// GET /conflicts/log - List logged conflicts.
async fn list_log_handler(State(state): State<AppState>) -> Result<Json<Vec<ConflictLogEntry>>> {
    Ok(Json(handle_list_log(&state)?))
}

/// DELETE /conflicts/log - Clear the conflict log.
async fn clear_log_handler(State(state): State<AppState>) -> Result<StatusCode> {
    handle_clear_log(&state)?;
    Ok(StatusCode::NO_CONTENT)
}
