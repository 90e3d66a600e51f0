//! Process-wide key-value store shared by all handlers.

use dashmap::DashMap;
use std::sync::Arc;
use vaxsync_engine::{KvStore, Result};

/// Concurrent in-memory store.
///
/// Documents are replaced whole on every write; two requests updating the
/// same key concurrently can lose one update.
#[derive(Debug, Default)]
pub struct SharedStore {
    entries: DashMap<String, String>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new store wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl KvStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
