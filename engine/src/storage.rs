//! Key-value persistence seam for the conflict log and sync state.
//!
//! Values are whole JSON documents. Every write replaces the document under
//! its key; there is no compare-and-swap, so concurrent writers to the same
//! key can lose updates.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A string key-value store.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: String) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Read and deserialize the document under `key`.
pub fn load_json<T: DeserializeOwned>(store: &impl KvStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize and write a document under `key`.
pub fn save_json<T: Serialize + ?Sized>(store: &impl KvStore, key: &str, value: &T) -> Result<()> {
    store.set(key, serde_json::to_string(value)?)
}

/// In-process store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn memory_store_basics() {
        let store = MemoryStore::new();
        assert!(store.is_empty().unwrap());
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1".into()).unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
        assert_eq!(store.len().unwrap(), 1);

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn poisoned_lock_is_a_storage_error() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(Error::Storage(_))));
        assert!(matches!(store.is_empty(), Err(Error::Storage(_))));
        assert!(matches!(store.get("a"), Err(Error::Storage(_))));
    }

    #[test]
    fn json_helpers_roundtrip_documents() {
        let store = MemoryStore::new();
        save_json(&store, "doc", &json!({"count": 2})).unwrap();

        let doc: Option<Value> = load_json(&store, "doc").unwrap();
        assert_eq!(doc, Some(json!({"count": 2})));

        let missing: Option<Value> = load_json(&store, "missing").unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn corrupt_document_is_serialization_error() {
        let store = MemoryStore::new();
        store.set("doc", "{oops".into()).unwrap();
        let err = load_json::<Value>(&store, "doc").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn shared_handles_see_same_data() {
        let store = Arc::new(MemoryStore::new());
        let other = Arc::clone(&store);
        store.set("k", "v".into()).unwrap();
        assert_eq!(other.get("k").unwrap(), Some("v".to_string()));
        assert_eq!((&*store).get("k").unwrap(), Some("v".to_string()));
    }
}
