//! Reconciliation of a local and a server dataset.
//!
//! # Algorithm
//!
//! 1. Key both sides by `id`
//! 2. Walk the union of ids: local ids in input order, then server-only ids
//! 3. One-sided ids pass through unchanged
//! 4. Ids on both sides with no detected conflict take the server copy
//! 5. Ids on both sides with conflicts are resolved with the requested
//!    strategy and reported
//!
//! The requested strategy is therefore only applied to the conflicting
//! subset.

use crate::detect::FieldConflict;
use crate::{Error, Record, Resolver, Result, Strategy, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Scope marker for an item-level conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictScope {
    #[default]
    Item,
}

/// All disagreements found for one id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConflict {
    pub id: Value,
    #[serde(rename = "type", default)]
    pub scope: ConflictScope,
    pub conflicts: Vec<FieldConflict>,
}

/// Counters describing a reconciliation.
///
/// `local_only` and `server_only` are input length minus conflict count, not
/// set differences; the exclusive counters hold the true differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStats {
    /// Records in the resolved output
    pub total: usize,
    /// Ids that had at least one conflict
    pub conflicts: usize,
    /// `local.len() - conflicts`
    pub local_only: usize,
    /// `server.len() - conflicts`
    pub server_only: usize,
    /// Ids present only in the local input
    pub local_exclusive: usize,
    /// Ids present only in the server input
    pub server_exclusive: usize,
    /// Ids present on both sides with no conflict
    pub unchanged: usize,
}

/// Result of reconciling two datasets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReconcileResult {
    pub resolved: Vec<Record>,
    pub conflicts: Vec<ItemConflict>,
    pub stats: ReconcileStats,
}

impl ReconcileResult {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Find a resolved record by id.
    pub fn get(&self, id: &Value) -> Option<&Record> {
        let key = key_of(id);
        self.resolved
            .iter()
            .find(|r| r.id().is_some_and(|rid| key_of(rid) == key))
    }
}

/// Largest magnitude below which every integer is exact in an `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Map key for an id. Distinguishes `1` from `"1"`; `1` and `1.0` share a key.
fn key_of(id: &Value) -> String {
    match id {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => (f as i64).to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Index records by id, keeping first-seen order. A repeated id keeps its
/// first position and its last record.
fn index<'a>(records: &'a [Record]) -> Result<(Vec<String>, HashMap<String, &'a Record>)> {
    let mut order = Vec::with_capacity(records.len());
    let mut by_id = HashMap::with_capacity(records.len());

    for (position, record) in records.iter().enumerate() {
        let id = record.id().ok_or(Error::MissingRecordId(position))?;
        let key = key_of(id);
        if by_id.insert(key.clone(), record).is_none() {
            order.push(key);
        }
    }

    Ok((order, by_id))
}

impl Resolver {
    /// Reconcile two datasets with the configured default strategy.
    pub fn reconcile_default(
        &self,
        local: &[Record],
        server: &[Record],
        now: Timestamp,
    ) -> Result<ReconcileResult> {
        self.reconcile(local, server, self.config().default_strategy, now)
    }

    /// Reconcile two datasets into one.
    ///
    /// Every id from either side appears exactly once in `resolved`. Fails
    /// with [`Error::MissingRecordId`] when a record carries no `id`.
    pub fn reconcile(
        &self,
        local: &[Record],
        server: &[Record],
        strategy: Strategy,
        now: Timestamp,
    ) -> Result<ReconcileResult> {
        let (local_order, local_by_id) = index(local)?;
        let (server_order, server_by_id) = index(server)?;

        let union = local_order.iter().chain(
            server_order
                .iter()
                .filter(|key| !local_by_id.contains_key(key.as_str())),
        );

        let mut result = ReconcileResult::default();

        for key in union {
            match (local_by_id.get(key), server_by_id.get(key)) {
                (Some(l), None) => {
                    result.stats.local_exclusive += 1;
                    result.resolved.push((*l).clone());
                }
                (None, Some(s)) => {
                    result.stats.server_exclusive += 1;
                    result.resolved.push((*s).clone());
                }
                (Some(l), Some(s)) => {
                    let conflicts = self.detect(l, s);
                    if conflicts.is_empty() {
                        result.stats.unchanged += 1;
                        result.resolved.push((*s).clone());
                    } else {
                        result.resolved.push(self.resolve(l, s, strategy, now));
                        result.conflicts.push(ItemConflict {
                            id: l.id().cloned().unwrap_or(Value::Null),
                            scope: ConflictScope::Item,
                            conflicts,
                        });
                    }
                }
                (None, None) => unreachable!("key comes from one of the indexes"),
            }
        }

        let conflict_count = result.conflicts.len();
        result.stats.total = result.resolved.len();
        result.stats.conflicts = conflict_count;
        result.stats.local_only = local.len().saturating_sub(conflict_count);
        result.stats.server_only = server.len().saturating_sub(conflict_count);

        tracing::info!(
            %strategy,
            total = result.stats.total,
            conflicts = conflict_count,
            "datasets reconciled"
        );

        Ok(result)
    }
}
