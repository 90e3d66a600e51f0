//! Record types exchanged between the local device and the server.
//!
//! Records are schemaless JSON objects. The only structure the engine relies
//! on is a handful of conventional members:
//!
//! - `id`: identifier used to pair local and server copies
//! - `_version`: integer revision
//! - `updatedAt` / `createdAt`: timestamps (RFC 3339 strings or epoch millis)
//!
//! A [`RecordKind`] tag is attached at ingestion time and travels on the wire
//! as the optional `_kind` member.

use crate::Timestamp;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Member holding the record identifier.
pub const ID_FIELD: &str = "id";
/// Member holding the record revision.
pub const VERSION_FIELD: &str = "_version";
/// Member holding the last modification time.
pub const UPDATED_AT_FIELD: &str = "updatedAt";
/// Member holding the creation time.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Marker set on records synthesized by a merge.
pub const CONFLICT_RESOLVED_FIELD: &str = "_conflictResolved";

/// Domain type of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Child,
    Vaccination,
    Mother,
    Chw,
    Facility,
    #[default]
    Unknown,
}

impl RecordKind {
    /// Classify a record from the members it carries.
    ///
    /// Checks, in order: `vaccineId`, `dateOfBirth` (with `motherId` for a
    /// child, without for a mother), `chwId`, `facilityCode`.
    pub fn infer(fields: &Map<String, Value>) -> Self {
        Self::infer_from(|name| fields.contains_key(name))
    }

    /// Classify a local/server pair from the union of their members.
    pub fn infer_pair(local: &Record, server: &Record) -> Self {
        Self::infer_from(|name| local.fields.contains_key(name) || server.fields.contains_key(name))
    }

    fn infer_from(has: impl Fn(&str) -> bool) -> Self {
        if has("vaccineId") {
            RecordKind::Vaccination
        } else if has("dateOfBirth") {
            if has("motherId") {
                RecordKind::Child
            } else {
                RecordKind::Mother
            }
        } else if has("chwId") {
            RecordKind::Chw
        } else if has("facilityCode") {
            RecordKind::Facility
        } else {
            RecordKind::Unknown
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, RecordKind::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Child => "child",
            RecordKind::Vaccination => "vaccination",
            RecordKind::Mother => "mother",
            RecordKind::Chw => "chw",
            RecordKind::Facility => "facility",
            RecordKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schemaless record with an attached kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Domain type, set by the caller at ingestion
    #[serde(rename = "_kind", default, skip_serializing_if = "RecordKind::is_unknown")]
    pub kind: RecordKind,
    /// All other members of the record
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record with an explicit kind.
    pub fn new(kind: RecordKind, fields: Map<String, Value>) -> Self {
        Self { kind, fields }
    }

    /// Create a record without a kind.
    pub fn untyped(fields: Map<String, Value>) -> Self {
        Self::new(RecordKind::Unknown, fields)
    }

    /// Create a record whose kind is inferred from its members.
    pub fn classified(fields: Map<String, Value>) -> Self {
        let kind = RecordKind::infer(&fields);
        Self::new(kind, fields)
    }

    /// Build a record from a JSON value, which must be an object.
    ///
    /// A `_kind` member is honoured; otherwise the kind is left unknown.
    pub fn from_value(value: Value) -> crate::Result<Self> {
        match value {
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            other => Err(crate::Error::InvalidRecord(format!(
                "expected object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Set the kind, consuming and returning the record.
    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set a member, consuming and returning the record.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Whether the member exists and holds a truthy value.
    pub fn is_truthy(&self, name: &str) -> bool {
        self.get(name).is_some_and(is_truthy)
    }

    /// Record identifier, if present and not null.
    pub fn id(&self) -> Option<&Value> {
        self.get(ID_FIELD).filter(|v| !v.is_null())
    }

    /// Integer revision from `_version`.
    pub fn version(&self) -> Option<i64> {
        let value = self.get(VERSION_FIELD)?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }

    /// Parsed `updatedAt`, if present and well formed.
    pub fn updated_at(&self) -> Option<Timestamp> {
        self.get(UPDATED_AT_FIELD).and_then(parse_timestamp)
    }

    /// Parsed `createdAt`, if present and well formed.
    pub fn created_at(&self) -> Option<Timestamp> {
        self.get(CREATED_AT_FIELD).and_then(parse_timestamp)
    }

    /// Modification time used for last-write-wins.
    ///
    /// Takes `updatedAt` when truthy, else `createdAt` when truthy, else 0.
    /// A present but unparsable value counts as 0.
    pub fn last_modified(&self) -> Timestamp {
        [UPDATED_AT_FIELD, CREATED_AT_FIELD]
            .iter()
            .find_map(|name| self.get(name).filter(|v| is_truthy(v)))
            .and_then(parse_timestamp)
            .unwrap_or(0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Record::untyped(fields)
    }
}

/// JavaScript-style truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Structural equality where numbers compare by value, so `2` equals `2.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, x)| y.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Parse a timestamp value into milliseconds since the epoch.
///
/// Accepts integer milliseconds, RFC 3339 strings, naive datetimes and bare
/// dates. Values without an offset are read as UTC.
pub fn parse_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Format milliseconds since the epoch as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn format_timestamp(ms: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn kind_travels_as_underscore_member() {
        let rec = record(json!({"_kind": "child", "id": 1, "name": "Amina"}));
        assert_eq!(rec.kind, RecordKind::Child);
        assert!(!rec.fields.contains_key("_kind"));

        let out = serde_json::to_value(&rec).unwrap();
        assert_eq!(out, json!({"_kind": "child", "id": 1, "name": "Amina"}));
    }

    #[test]
    fn unknown_kind_is_not_serialized() {
        let rec = record(json!({"id": 1}));
        assert_eq!(rec.kind, RecordKind::Unknown);
        assert_eq!(serde_json::to_value(&rec).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn from_value_rejects_non_objects() {
        let err = Record::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(
            err,
            crate::Error::InvalidRecord("expected object, got array".into())
        );
    }

    #[test]
    fn infer_kind_order() {
        let fields = |v: Value| v.as_object().cloned().unwrap();

        assert_eq!(
            RecordKind::infer(&fields(json!({"vaccineId": "bcg", "dateOfBirth": "2024-01-01"}))),
            RecordKind::Vaccination
        );
        assert_eq!(
            RecordKind::infer(&fields(json!({"dateOfBirth": "2024-01-01", "motherId": 4}))),
            RecordKind::Child
        );
        assert_eq!(
            RecordKind::infer(&fields(json!({"dateOfBirth": "1990-05-01"}))),
            RecordKind::Mother
        );
        assert_eq!(
            RecordKind::infer(&fields(json!({"chwId": "c1", "facilityCode": "F1"}))),
            RecordKind::Chw
        );
        assert_eq!(
            RecordKind::infer(&fields(json!({"facilityCode": "F1"}))),
            RecordKind::Facility
        );
        assert_eq!(RecordKind::infer(&fields(json!({"id": 9}))), RecordKind::Unknown);
    }

    #[test]
    fn infer_pair_uses_union_of_members() {
        let local = record(json!({"id": 1, "dateOfBirth": "2023-02-01"}));
        let server = record(json!({"id": 1, "motherId": 7}));
        assert_eq!(RecordKind::infer_pair(&local, &server), RecordKind::Child);
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(-1)));
    }

    #[test]
    fn parse_timestamp_formats() {
        assert_eq!(parse_timestamp(&json!(1_700_000_000_000i64)), Some(1_700_000_000_000));
        assert_eq!(
            parse_timestamp(&json!("2024-01-01T00:00:00Z")),
            Some(1_704_067_200_000)
        );
        assert_eq!(
            parse_timestamp(&json!("2024-01-01T03:00:00+03:00")),
            Some(1_704_067_200_000)
        );
        assert_eq!(
            parse_timestamp(&json!("2024-01-01T00:00:00.250")),
            Some(1_704_067_200_250)
        );
        assert_eq!(parse_timestamp(&json!("2024-01-01")), Some(1_704_067_200_000));
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
    }

    #[test]
    fn last_modified_falls_back() {
        let rec = record(json!({"updatedAt": "1970-01-01T00:00:01Z", "createdAt": 5}));
        assert_eq!(rec.last_modified(), 1000);

        let rec = record(json!({"updatedAt": "", "createdAt": "1970-01-01T00:00:02Z"}));
        assert_eq!(rec.last_modified(), 2000);

        let rec = record(json!({"updatedAt": "garbage", "createdAt": "1970-01-01T00:00:02Z"}));
        assert_eq!(rec.last_modified(), 0);

        assert_eq!(record(json!({"id": 1})).last_modified(), 0);
    }

    #[test]
    fn format_timestamp_uses_millis_and_z() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_timestamp(1_704_067_200_250), "2024-01-01T00:00:00.250Z");
    }

    #[test]
    fn version_accessor() {
        assert_eq!(record(json!({"_version": 3})).version(), Some(3));
        assert_eq!(record(json!({"_version": 2.0})).version(), Some(2));
        assert_eq!(record(json!({"_version": "3"})).version(), None);
        assert_eq!(record(json!({})).version(), None);
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(values_equal(&json!(2), &json!(2.0)));
        assert!(values_equal(&json!(-7), &json!(-7.0)));
        assert!(!values_equal(&json!(2), &json!(2.5)));
        assert!(!values_equal(&json!(i64::MAX), &json!(i64::MAX - 1)));
        assert!(values_equal(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!values_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn id_ignores_null() {
        assert_eq!(record(json!({"id": "m-1"})).id(), Some(&json!("m-1")));
        assert_eq!(record(json!({"id": null})).id(), None);
    }
}
