//! Conflict handlers - detection, resolution and dataset reconciliation.

use crate::error::Result;
use crate::AppState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vaxsync_engine::{
    ConflictLog, ConflictLogEntry, FieldConflict, KvStore, ReconcileResult, Record, Strategy,
    Timestamp,
};

/// Request body for pair detection.
#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub local: Record,
    pub server: Record,
}

/// Request body for pair resolution.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub local: Record,
    pub server: Record,
    /// Strategy name; unknown names fall back to last-write-wins
    pub strategy: Option<String>,
    /// Append the outcome to the conflict log
    #[serde(default)]
    pub log: bool,
    /// Caller context stored with the log entry
    #[serde(default)]
    pub context: Value,
    /// Whether the client was online when the conflict arose
    #[serde(default = "default_online")]
    pub online: bool,
}

/// Response for pair resolution.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub strategy: Strategy,
    pub resolved: Record,
    pub conflicts: Vec<FieldConflict>,
    pub logged: bool,
}

/// Request body for dataset reconciliation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    #[serde(default)]
    pub local: Vec<Record>,
    #[serde(default)]
    pub server: Vec<Record>,
    pub strategy: Option<String>,
    /// Append one log entry per conflicting id
    #[serde(default)]
    pub log: bool,
    #[serde(default = "default_online")]
    pub online: bool,
}

fn default_online() -> bool {
    true
}

/// Strategy named in a request, or the configured default.
fn requested_strategy(state: &AppState, name: Option<&str>) -> Strategy {
    name.map(Strategy::lenient)
        .unwrap_or(state.resolver.config().default_strategy)
}

/// Conflict log over the shared store, sized from config.
pub fn conflict_log(state: &AppState) -> ConflictLog<impl KvStore> {
    ConflictLog::new(state.store.clone())
        .with_key(state.config.keys.conflict_log.clone())
        .with_capacity(state.config.log_capacity)
}

/// List the disagreements between two copies of a record.
pub fn handle_detect(state: &AppState, request: DetectRequest) -> Vec<FieldConflict> {
    state.resolver.detect(&request.local, &request.server)
}

/// Resolve two copies of a record, optionally logging the outcome.
pub fn handle_resolve(
    state: &AppState,
    request: ResolveRequest,
    user_agent: Option<String>,
    now: Timestamp,
) -> Result<ResolveResponse> {
    let strategy = requested_strategy(state, request.strategy.as_deref());
    let conflicts = state.resolver.detect(&request.local, &request.server);
    let resolved = state
        .resolver
        .resolve(&request.local, &request.server, strategy, now);

    if request.log {
        let mut entry = ConflictLogEntry::new(&conflicts, &resolved, now)?
            .with_context(request.context)
            .online(request.online);
        if let Some(agent) = user_agent {
            entry = entry.with_user_agent(agent);
        }
        conflict_log(state).append(entry)?;
    }

    Ok(ResolveResponse {
        strategy,
        resolved,
        conflicts,
        logged: request.log,
    })
}

/// Reconcile two datasets, optionally logging every conflicting id.
pub fn handle_reconcile(
    state: &AppState,
    request: ReconcileRequest,
    user_agent: Option<String>,
    now: Timestamp,
) -> Result<ReconcileResult> {
    let strategy = requested_strategy(state, request.strategy.as_deref());
    let result = state
        .resolver
        .reconcile(&request.local, &request.server, strategy, now)?;

    if request.log && result.has_conflicts() {
        let log = conflict_log(state);
        for item in &result.conflicts {
            let resolution = result.get(&item.id).cloned().unwrap_or_default();
            let mut entry = ConflictLogEntry::new(item, &resolution, now)?
                .with_context(serde_json::json!({"strategy": strategy}))
                .online(request.online);
            if let Some(agent) = &user_agent {
                entry = entry.with_user_agent(agent.clone());
            }
            log.append(entry)?;
        }
        tracing::info!(count = result.conflicts.len(), "reconciliation conflicts logged");
    }

    Ok(result)
}

/// All logged conflicts, oldest first.
pub fn handle_list_log(state: &AppState) -> Result<Vec<ConflictLogEntry>> {
    Ok(conflict_log(state).entries()?)
}

/// Drop every logged conflict.
pub fn handle_clear_log(state: &AppState) -> Result<()> {
    Ok(conflict_log(state).clear()?)
}
