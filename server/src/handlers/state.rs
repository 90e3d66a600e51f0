//! Sync-state handlers.

use crate::error::{AppError, Result};
use crate::AppState;
use serde::Serialize;
use serde_json::{Map, Value};
use vaxsync_engine::{KvStore, SyncStateManager, Timestamp};

/// Overview of the sync bookkeeping.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    /// Items waiting in the sync queue
    pub pending_count: usize,
    /// When the last sync completed
    pub last_sync: Option<String>,
    /// All named entries
    pub entries: Map<String, Value>,
}

fn sync_state(state: &AppState) -> SyncStateManager<impl KvStore> {
    SyncStateManager::with_keys(state.store.clone(), state.config.keys.clone())
}

pub fn handle_summary(state: &AppState) -> Result<SyncSummary> {
    let manager = sync_state(state);
    Ok(SyncSummary {
        pending_count: manager.pending_count()?,
        last_sync: manager.last_sync_time()?,
        entries: manager.all()?,
    })
}

pub fn handle_get_entry(state: &AppState, name: &str) -> Result<Map<String, Value>> {
    sync_state(state)
        .get(name)?
        .ok_or_else(|| AppError::NotFound(format!("sync state '{}'", name)))
}

pub fn handle_put_entry(
    state: &AppState,
    name: &str,
    fields: Value,
    now: Timestamp,
) -> Result<Map<String, Value>> {
    let Value::Object(fields) = fields else {
        return Err(AppError::BadRequest("sync state must be a JSON object".into()));
    };
    Ok(sync_state(state).set(name, fields, now)?)
}

pub fn handle_mark_synced(state: &AppState, now: Timestamp) -> Result<Map<String, Value>> {
    Ok(sync_state(state).mark_synced(now)?)
}

pub fn handle_clear(state: &AppState) -> Result<()> {
    Ok(sync_state(state).clear()?)
}
