//! Field-level conflict detection between a local and a server record.
//!
//! Checks run in a fixed order: version, timestamp, then each key field in
//! configured order. A member only takes part in a check when both sides
//! carry a truthy value; absence on either side is never a conflict.
//! Numbers compare by value.

use crate::record::{is_truthy, values_equal, UPDATED_AT_FIELD, VERSION_FIELD};
use crate::{Record, ResolverConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category of a field-level disagreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// `_version` differs
    Version,
    /// `updatedAt` values are further apart than the threshold
    Timestamp,
    /// A key field differs
    Data,
}

/// A single disagreement between two copies of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub field: String,
    pub local: Value,
    pub server: Value,
}

impl FieldConflict {
    pub fn new(kind: ConflictKind, field: impl Into<String>, local: Value, server: Value) -> Self {
        Self {
            kind,
            field: field.into(),
            local,
            server,
        }
    }
}

/// Compare two records and list their disagreements in detection order.
pub fn detect_conflicts(
    local: &Record,
    server: &Record,
    config: &ResolverConfig,
) -> Vec<FieldConflict> {
    let mut conflicts = Vec::new();

    if let (Some(l), Some(s)) = (truthy(local, VERSION_FIELD), truthy(server, VERSION_FIELD)) {
        if !values_equal(l, s) {
            conflicts.push(FieldConflict::new(
                ConflictKind::Version,
                VERSION_FIELD,
                l.clone(),
                s.clone(),
            ));
        }
    }

    if let (Some(l), Some(s)) = (truthy(local, UPDATED_AT_FIELD), truthy(server, UPDATED_AT_FIELD)) {
        // Unparsable timestamps never conflict
        if let (Some(lt), Some(st)) = (local.updated_at(), server.updated_at()) {
            if lt.abs_diff(st) > config.timestamp_threshold_ms.max(0) as u64 {
                conflicts.push(FieldConflict::new(
                    ConflictKind::Timestamp,
                    UPDATED_AT_FIELD,
                    l.clone(),
                    s.clone(),
                ));
            }
        }
    }

    for field in &config.key_fields {
        if let (Some(l), Some(s)) = (truthy(local, field), truthy(server, field)) {
            if !values_equal(l, s) {
                conflicts.push(FieldConflict::new(
                    ConflictKind::Data,
                    field.as_str(),
                    l.clone(),
                    s.clone(),
                ));
            }
        }
    }

    if !conflicts.is_empty() {
        tracing::debug!(
            id = ?local.id(),
            count = conflicts.len(),
            "conflicts detected"
        );
    }

    conflicts
}

fn truthy<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| is_truthy(v))
}
