//! Tunables for detection, resolution and the persisted helpers.

use crate::Strategy;
use serde::{Deserialize, Serialize};

/// Default window within which two `updatedAt` values are considered equal.
pub const DEFAULT_TIMESTAMP_THRESHOLD_MS: i64 = 5000;

/// Default number of conflict log entries kept.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Fields whose disagreement counts as a data conflict, in detection order.
pub const DEFAULT_KEY_FIELDS: [&str; 5] = ["name", "phone", "dateOfBirth", "vaccineId", "batchNumber"];

/// Configuration for the [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// Strategy used when a caller does not name one
    pub default_strategy: Strategy,
    /// `updatedAt` values further apart than this are a timestamp conflict
    pub timestamp_threshold_ms: i64,
    /// Fields compared for data conflicts, in order
    pub key_fields: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_strategy: Strategy::default(),
            timestamp_threshold_ms: DEFAULT_TIMESTAMP_THRESHOLD_MS,
            key_fields: DEFAULT_KEY_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl ResolverConfig {
    pub fn with_default_strategy(mut self, strategy: Strategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    pub fn with_timestamp_threshold_ms(mut self, threshold: i64) -> Self {
        self.timestamp_threshold_ms = threshold;
        self
    }

    pub fn with_key_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Names of the persisted keys shared with the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageKeys {
    pub conflict_log: String,
    pub sync_state: String,
    pub sync_queue: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            conflict_log: "conflictLog".to_string(),
            sync_state: "syncState".to_string(),
            sync_queue: "syncQueue".to_string(),
        }
    }
}
