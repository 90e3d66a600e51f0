//! Persisted sync bookkeeping.
//!
//! A single JSON object holds one entry per named state. Each write stamps
//! the entry with `lastUpdated`. The `lastSync` entry records the last
//! completed sync. The pending queue lives under its own key and is only
//! counted here.

use crate::config::StorageKeys;
use crate::record::format_timestamp;
use crate::storage::{load_json, save_json, KvStore};
use crate::{Result, Timestamp};
use serde_json::{Map, Value};

/// Name of the entry recording the last completed sync.
pub const LAST_SYNC: &str = "lastSync";

/// Member stamped on every written entry.
pub const LAST_UPDATED: &str = "lastUpdated";

/// Read/write access to named sync-state entries.
#[derive(Debug, Clone)]
pub struct SyncStateManager<S> {
    store: S,
    keys: StorageKeys,
}

impl<S: KvStore> SyncStateManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_keys(store, StorageKeys::default())
    }

    pub fn with_keys(store: S, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    /// Every entry, keyed by name.
    pub fn all(&self) -> Result<Map<String, Value>> {
        Ok(load_json(&self.store, &self.keys.sync_state)?.unwrap_or_default())
    }

    /// A single named entry.
    pub fn get(&self, name: &str) -> Result<Option<Map<String, Value>>> {
        Ok(self.all()?.remove(name).and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        }))
    }

    /// Replace a named entry, stamping `lastUpdated` with `now`.
    ///
    /// Returns the stored entry.
    pub fn set(
        &self,
        name: &str,
        mut fields: Map<String, Value>,
        now: Timestamp,
    ) -> Result<Map<String, Value>> {
        fields.insert(LAST_UPDATED.to_string(), Value::String(format_timestamp(now)));

        let mut state = self.all()?;
        state.insert(name.to_string(), Value::Object(fields.clone()));
        save_json(&self.store, &self.keys.sync_state, &state)?;

        tracing::debug!(name, "sync state updated");
        Ok(fields)
    }

    /// Record a completed sync at `now`.
    pub fn mark_synced(&self, now: Timestamp) -> Result<Map<String, Value>> {
        self.set(LAST_SYNC, Map::new(), now)
    }

    /// When the last sync completed, as written by [`mark_synced`](Self::mark_synced).
    pub fn last_sync_time(&self) -> Result<Option<String>> {
        Ok(self
            .get(LAST_SYNC)?
            .and_then(|entry| entry.get(LAST_UPDATED).and_then(Value::as_str).map(String::from)))
    }

    /// Number of items waiting in the sync queue.
    pub fn pending_count(&self) -> Result<usize> {
        match load_json::<Value>(&self.store, &self.keys.sync_queue)? {
            Some(Value::Array(items)) => Ok(items.len()),
            Some(other) => {
                tracing::warn!(
                    key = %self.keys.sync_queue,
                    found = ?other,
                    "sync queue is not a list, treating as empty"
                );
                Ok(0)
            }
            None => Ok(0),
        }
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.keys.sync_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn set_stamps_last_updated() {
        let store = MemoryStore::new();
        let state = SyncStateManager::new(&store);

        let stored = state
            .set("children", fields(json!({"cursor": 42})), 1000)
            .unwrap();
        assert_eq!(stored["lastUpdated"], json!("1970-01-01T00:00:01.000Z"));

        let read = state.get("children").unwrap().unwrap();
        assert_eq!(read, fields(json!({"cursor": 42, "lastUpdated": "1970-01-01T00:00:01.000Z"})));
        assert_eq!(state.get("mothers").unwrap(), None);
    }

    #[test]
    fn entries_are_independent() {
        let store = MemoryStore::new();
        let state = SyncStateManager::new(&store);
        state.set("a", Map::new(), 1).unwrap();
        state.set("b", Map::new(), 2).unwrap();
        state.set("a", fields(json!({"x": 1})), 3).unwrap();

        let all = state.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["a"]["x"], json!(1));
        assert_eq!(all["b"]["lastUpdated"], json!("1970-01-01T00:00:00.002Z"));
    }

    #[test]
    fn last_sync_time() {
        let store = MemoryStore::new();
        let state = SyncStateManager::new(&store);
        assert_eq!(state.last_sync_time().unwrap(), None);

        state.mark_synced(1_704_067_200_000).unwrap();
        assert_eq!(
            state.last_sync_time().unwrap(),
            Some("2024-01-01T00:00:00.000Z".to_string())
        );
    }

    #[test]
    fn pending_count_reads_queue_length() {
        let store = MemoryStore::new();
        let state = SyncStateManager::new(&store);
        assert_eq!(state.pending_count().unwrap(), 0);

        store.set("syncQueue", r#"[{"op": 1}, {"op": 2}]"#.into()).unwrap();
        assert_eq!(state.pending_count().unwrap(), 2);

        store.set("syncQueue", r#"{"op": 1}"#.into()).unwrap();
        assert_eq!(state.pending_count().unwrap(), 0);
    }

    #[test]
    fn custom_keys() {
        let store = MemoryStore::new();
        let keys = StorageKeys {
            sync_queue: "outbox".into(),
            ..StorageKeys::default()
        };
        let state = SyncStateManager::with_keys(&store, keys);
        store.set("outbox", "[1]".into()).unwrap();
        assert_eq!(state.pending_count().unwrap(), 1);
    }

    #[test]
    fn clear_removes_entries() {
        let store = MemoryStore::new();
        let state = SyncStateManager::new(&store);
        state.mark_synced(5).unwrap();
        state.clear().unwrap();
        assert!(state.all().unwrap().is_empty());
        assert_eq!(state.last_sync_time().unwrap(), None);
    }
}
