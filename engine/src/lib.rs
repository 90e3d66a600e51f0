//! # Vaxsync Engine
//!
//! Conflict resolution for offline-captured vaccination records.
//!
//! A device keeps working while offline; when it reconnects, each record may
//! exist in two versions, the local copy and the server copy. This crate
//! decides what the merged dataset looks like.
//!
//! ## Design Principles
//!
//! - **No IO in resolution**: detection, resolution and reconciliation are
//!   pure functions of their inputs and an injected clock value
//! - **Injected persistence**: the conflict log and sync state run over a
//!   [`KvStore`] supplied by the caller
//! - **Portable**: usable natively, over FFI, or behind the HTTP server
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Record`] is a schemaless JSON object plus a [`RecordKind`] tag
//! (child, vaccination, mother, CHW, facility) attached at ingestion.
//!
//! ### Detection
//!
//! [`Resolver::detect`] lists [`FieldConflict`]s: a differing `_version`,
//! `updatedAt` values more than five seconds apart, or a differing key
//! field (`name`, `phone`, `dateOfBirth`, `vaccineId`, `batchNumber`).
//!
//! ### Strategies
//!
//! [`Resolver::resolve`] turns a pair into one record:
//! - [`Strategy::LastWriteWins`] - later timestamp wins, ties go to the server (default)
//! - [`Strategy::ClientWins`] / [`Strategy::ServerWins`] - one side always wins
//! - [`Strategy::Merge`] - shallow merge, local members on top
//! - [`Strategy::Custom`] - per-kind rules
//!
//! ### Reconciliation
//!
//! [`Resolver::reconcile`] merges two datasets keyed by `id`.
//!
//! ## Quick Start
//!
//! ```rust
//! use vaxsync_engine::{Record, Resolver, Strategy};
//! use serde_json::json;
//!
//! let local: Vec<Record> = serde_json::from_value(json!([
//!     {"id": 1, "name": "Amina", "updatedAt": "2024-01-02T00:00:00Z"},
//! ]))
//! .unwrap();
//! let server: Vec<Record> = serde_json::from_value(json!([
//!     {"id": 1, "name": "Amina W.", "updatedAt": "2024-01-01T00:00:00Z"},
//!     {"id": 2, "name": "Baraka"},
//! ]))
//! .unwrap();
//!
//! let resolver = Resolver::default();
//! let result = resolver
//!     .reconcile(&local, &server, Strategy::LastWriteWins, 1717200000000)
//!     .unwrap();
//!
//! assert_eq!(result.resolved.len(), 2);
//! assert_eq!(result.conflicts.len(), 1);
//! assert_eq!(result.resolved[0].get("name"), Some(&json!("Amina")));
//! ```
//!
//! ## FFI
//!
//! The [`ffi`] module provides C-compatible functions for use from other
//! languages. All data is exchanged as JSON strings.

pub mod config;
pub mod conflict_log;
pub mod detect;
pub mod error;
pub mod ffi;
pub mod reconcile;
pub mod record;
pub mod resolve;
pub mod storage;
pub mod strategy;
pub mod sync_state;

// Re-export main types at crate root
pub use config::{ResolverConfig, StorageKeys};
pub use conflict_log::{ConflictLog, ConflictLogEntry};
pub use detect::{detect_conflicts, ConflictKind, FieldConflict};
pub use error::{Error, Result};
pub use reconcile::{ConflictScope, ItemConflict, ReconcileResult, ReconcileStats};
pub use record::{Record, RecordKind};
pub use resolve::Resolver;
pub use storage::{KvStore, MemoryStore};
pub use strategy::Strategy;
pub use sync_state::SyncStateManager;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;
