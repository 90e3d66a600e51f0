//! Persisted log of resolved conflicts.
//!
//! The log is a JSON array under a single key, newest entry last, capped at a
//! fixed number of entries. Resolvers never write to it; callers append
//! explicitly.

use crate::config::{StorageKeys, DEFAULT_LOG_CAPACITY};
use crate::record::format_timestamp;
use crate::storage::{load_json, save_json, KvStore};
use crate::{Result, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One logged conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictLogEntry {
    /// When the entry was written (RFC 3339)
    pub timestamp: String,
    /// The conflict as reported by detection
    pub conflict: Value,
    /// The record or decision that resolved it
    pub resolution: Value,
    /// Free-form caller context
    #[serde(default)]
    pub context: Value,
    /// Client that resolved the conflict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Whether the client was online at resolution time
    #[serde(default = "default_online")]
    pub online: bool,
}

fn default_online() -> bool {
    true
}

impl ConflictLogEntry {
    pub fn new(conflict: impl Serialize, resolution: impl Serialize, now: Timestamp) -> Result<Self> {
        Ok(Self {
            timestamp: format_timestamp(now),
            conflict: serde_json::to_value(conflict)?,
            resolution: serde_json::to_value(resolution)?,
            context: Value::Null,
            user_agent: None,
            online: true,
        })
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }
}

/// Capped conflict log over a [`KvStore`].
#[derive(Debug, Clone)]
pub struct ConflictLog<S> {
    store: S,
    key: String,
    capacity: usize,
}

impl<S: KvStore> ConflictLog<S> {
    /// Create a log under the default key with the default capacity.
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: StorageKeys::default().conflict_log,
            capacity: DEFAULT_LOG_CAPACITY,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry, dropping the oldest entries beyond capacity.
    pub fn append(&self, entry: ConflictLogEntry) -> Result<()> {
        let mut entries = self.entries()?;
        entries.push(entry);

        if entries.len() > self.capacity {
            let overflow = entries.len() - self.capacity;
            entries.drain(..overflow);
            tracing::debug!(dropped = overflow, "conflict log truncated");
        }

        save_json(&self.store, &self.key, &entries)
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Result<Vec<ConflictLogEntry>> {
        Ok(load_json(&self.store, &self.key)?.unwrap_or_default())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        tracing::info!(key = %self.key, "conflict log cleared");
        self.store.remove(&self.key)
    }
}
