//! Resolution of a single local/server record pair.
//!
//! Every strategy returns exactly one record, either one of the inputs
//! unchanged or a merge of both. Merged records carry a bumped `_version`,
//! a fresh `updatedAt` and the `_conflictResolved` marker.
//!
//! # Custom rules
//!
//! Under [`Strategy::Custom`] the record kind picks the rule:
//!
//! - **Child**: growth measurements come from local when local measured,
//!   allergies and medical conditions come from the server when it has any
//! - **Vaccination**: a side reporting `completed` wins outright over one
//!   that does not; otherwise last-write-wins
//! - **Mother**: reminder preferences merge with local keys on top,
//!   identity fields come from the server when it has any
//! - anything else: last-write-wins

use crate::detect::{detect_conflicts, FieldConflict};
use crate::record::{
    format_timestamp, is_truthy, CONFLICT_RESOLVED_FIELD, UPDATED_AT_FIELD, VERSION_FIELD,
};
use crate::{Record, RecordKind, ResolverConfig, Strategy, Timestamp};
use serde_json::{Map, Value};

const GROWTH_FIELDS: [&str; 3] = ["lastWeight", "lastHeight", "lastMeasurementDate"];
const CHILD_SAFETY_FIELDS: [&str; 2] = ["allergies", "medicalConditions"];
const MOTHER_IDENTITY_FIELDS: [&str; 2] = ["idNumber", "dateOfBirth"];
const REMINDER_PREFERENCES: &str = "reminderPreferences";
const STATUS_COMPLETED: &str = "completed";

/// Detects and resolves conflicts between record copies.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    /// Create a resolver with the given configuration.
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// List the disagreements between two copies of a record.
    pub fn detect(&self, local: &Record, server: &Record) -> Vec<FieldConflict> {
        detect_conflicts(local, server, &self.config)
    }

    /// Resolve a pair with the configured default strategy.
    pub fn resolve_default(&self, local: &Record, server: &Record, now: Timestamp) -> Record {
        self.resolve(local, server, self.config.default_strategy, now)
    }

    /// Resolve a pair into a single record.
    ///
    /// `now` is the resolution time in milliseconds since the epoch and is
    /// written to `updatedAt` on merged results.
    pub fn resolve(
        &self,
        local: &Record,
        server: &Record,
        strategy: Strategy,
        now: Timestamp,
    ) -> Record {
        tracing::debug!(id = ?local.id(), %strategy, "resolving conflict");

        match strategy {
            Strategy::LastWriteWins => last_write_wins(local, server),
            Strategy::ClientWins => local.clone(),
            Strategy::ServerWins => server.clone(),
            Strategy::Merge => merge_records(local, server, now),
            Strategy::Custom => resolve_custom(local, server, now),
        }
    }
}

/// Pick the copy with the later modification time; ties go to the server.
pub fn last_write_wins(local: &Record, server: &Record) -> Record {
    if local.last_modified() > server.last_modified() {
        local.clone()
    } else {
        server.clone()
    }
}

/// Shallow merge with local members overriding server members.
///
/// `_version` becomes `max + 1` only when both sides carry a truthy one.
pub fn merge_records(local: &Record, server: &Record, now: Timestamp) -> Record {
    let mut merged = overlay(local, server);

    if let (Some(l), Some(s)) = (truthy_version(local), truthy_version(server)) {
        merged.set(VERSION_FIELD, l.max(s).saturating_add(1));
    }
    merged.set(UPDATED_AT_FIELD, format_timestamp(now));
    merged.set(CONFLICT_RESOLVED_FIELD, true);
    merged
}

/// Apply the per-kind rules of [`Strategy::Custom`].
///
/// The kind is the local record's, or the server's when local is unknown.
pub fn resolve_custom(local: &Record, server: &Record, now: Timestamp) -> Record {
    let kind = if local.kind.is_unknown() {
        server.kind
    } else {
        local.kind
    };

    match kind {
        RecordKind::Child => resolve_child(local, server, now),
        RecordKind::Vaccination => resolve_vaccination(local, server),
        RecordKind::Mother => resolve_mother(local, server, now),
        RecordKind::Chw | RecordKind::Facility | RecordKind::Unknown => {
            last_write_wins(local, server)
        }
    }
}

fn resolve_child(local: &Record, server: &Record, now: Timestamp) -> Record {
    let mut merged = overlay(local, server);

    if local.is_truthy("lastWeight") || local.is_truthy("lastHeight") {
        copy_fields(&mut merged, local, &GROWTH_FIELDS);
    }
    if CHILD_SAFETY_FIELDS.iter().any(|f| server.is_truthy(f)) {
        copy_fields(&mut merged, server, &CHILD_SAFETY_FIELDS);
    }

    stamp_resolved(&mut merged, local, server, now);
    merged
}

fn resolve_vaccination(local: &Record, server: &Record) -> Record {
    let completed = |r: &Record| r.get("status").and_then(Value::as_str) == Some(STATUS_COMPLETED);

    match (completed(local), completed(server)) {
        (true, false) => local.clone(),
        (false, true) => server.clone(),
        _ => last_write_wins(local, server),
    }
}

fn resolve_mother(local: &Record, server: &Record, now: Timestamp) -> Record {
    let mut merged = overlay(local, server);

    if let Some(local_prefs) = local.get(REMINDER_PREFERENCES).filter(|v| is_truthy(v)) {
        let prefs = match (server.get(REMINDER_PREFERENCES), local_prefs) {
            (Some(Value::Object(server_map)), Value::Object(local_map)) => {
                let mut combined: Map<String, Value> = server_map.clone();
                combined.extend(local_map.clone());
                Value::Object(combined)
            }
            _ => local_prefs.clone(),
        };
        merged.set(REMINDER_PREFERENCES, prefs);
    }
    if MOTHER_IDENTITY_FIELDS.iter().any(|f| server.is_truthy(f)) {
        copy_fields(&mut merged, server, &MOTHER_IDENTITY_FIELDS);
    }

    stamp_resolved(&mut merged, local, server, now);
    merged
}

fn truthy_version(record: &Record) -> Option<i64> {
    if record.is_truthy(VERSION_FIELD) {
        record.version()
    } else {
        None
    }
}

/// Server members with local members laid over them.
fn overlay(local: &Record, server: &Record) -> Record {
    let mut fields = server.fields.clone();
    fields.extend(local.fields.clone());
    let kind = if local.kind.is_unknown() {
        server.kind
    } else {
        local.kind
    };
    Record::new(kind, fields)
}

/// Take each field from `source`, dropping it when `source` lacks it.
fn copy_fields(target: &mut Record, source: &Record, fields: &[&str]) {
    for field in fields {
        match source.get(field) {
            Some(value) => target.set(*field, value.clone()),
            None => {
                target.remove(field);
            }
        }
    }
}

fn stamp_resolved(merged: &mut Record, local: &Record, server: &Record, now: Timestamp) {
    let version = local
        .version()
        .unwrap_or(0)
        .max(server.version().unwrap_or(0))
        .saturating_add(1);
    merged.set(VERSION_FIELD, version);
    merged.set(UPDATED_AT_FIELD, format_timestamp(now));
    merged.set(CONFLICT_RESOLVED_FIELD, true);
}
