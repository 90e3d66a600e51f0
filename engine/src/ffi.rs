//! FFI layer for mobile and web-view hosts.
//!
//! This module provides C-compatible functions over a [`Resolver`] handle.
//! All data crosses the boundary as JSON strings.
//!
//! # Memory Management
//!
//! - Strings returned by `vaxsync_*` functions are allocated by Rust
//! - Caller must free them with `vaxsync_string_free`
//! - Resolver pointers must be freed with `vaxsync_resolver_free`
//!
//! # Error Handling
//!
//! Functions return JSON with either:
//! - `{"ok": <result>}` on success
//! - `{"error": "<message>"}` on failure
//!
//! Strategy names are parsed leniently: unknown or null names fall back to
//! the resolver's default strategy rules (see [`Strategy::lenient`]).

use crate::{Record, RecordKind, Resolver, ResolverConfig, Strategy, Timestamp};
use serde::de::DeserializeOwned;
use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Result wrapper for FFI responses.
#[derive(serde::Serialize)]
#[serde(untagged)]
enum FfiResult<T: serde::Serialize> {
    Ok { ok: T },
    Err { error: String },
}

impl<T: serde::Serialize> FfiResult<T> {
    fn ok(value: T) -> Self {
        FfiResult::Ok { ok: value }
    }

    fn err(message: impl Into<String>) -> Self {
        FfiResult::Err {
            error: message.into(),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
    }
}

fn respond<T: serde::Serialize>(result: Result<T, String>) -> *mut c_char {
    let response = match result {
        Ok(value) => FfiResult::ok(value),
        Err(message) => FfiResult::err(message),
    };
    to_c_string(response.to_json())
}

/// Convert a Rust string to a C string pointer.
/// Caller must free with `vaxsync_string_free`.
fn to_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => {
            // String contained null bytes - return error JSON
            CString::new(r#"{"error":"string contained null bytes"}"#)
                .unwrap_or_default()
                .into_raw()
        }
    }
}

/// Convert a C string pointer to a Rust string.
/// Returns None if pointer is null or invalid UTF-8.
unsafe fn from_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Parse a required JSON argument.
unsafe fn parse_arg<T: DeserializeOwned>(ptr: *const c_char, name: &str) -> Result<T, String> {
    let raw = from_c_string(ptr).ok_or_else(|| format!("invalid {} JSON", name))?;
    serde_json::from_str(&raw).map_err(|e| format!("parse error in {}: {}", name, e))
}

/// Strategy from an optional name, defaulting to the resolver's configured one.
unsafe fn strategy_arg(resolver: &Resolver, ptr: *const c_char) -> Strategy {
    match from_c_string(ptr) {
        Some(name) => Strategy::lenient(&name),
        None => resolver.config().default_strategy,
    }
}

unsafe fn resolver_ref<'a>(resolver: *const Resolver) -> Result<&'a Resolver, String> {
    resolver.as_ref().ok_or_else(|| "null resolver pointer".to_string())
}

// ============================================================================
// Resolver Lifecycle
// ============================================================================

/// Create a new resolver.
///
/// # Arguments
/// - `config_json`: JSON string of ResolverConfig, or null for defaults
///
/// # Returns
/// Pointer to Resolver, or null if the configuration does not parse.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or null
/// - Caller must free the returned pointer with `vaxsync_resolver_free`
#[no_mangle]
pub unsafe extern "C" fn vaxsync_resolver_new(config_json: *const c_char) -> *mut Resolver {
    let config = if config_json.is_null() {
        ResolverConfig::default()
    } else {
        match parse_arg::<ResolverConfig>(config_json, "config") {
            Ok(config) => config,
            Err(_) => return ptr::null_mut(),
        }
    };

    Box::into_raw(Box::new(Resolver::new(config)))
}

/// Free a resolver.
///
/// # Safety
/// - `resolver` must be a valid pointer from `vaxsync_resolver_new`
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn vaxsync_resolver_free(resolver: *mut Resolver) {
    if !resolver.is_null() {
        drop(Box::from_raw(resolver));
    }
}

/// Free a string allocated by the engine.
///
/// # Safety
/// - `s` must be a valid pointer from a `vaxsync_*` function
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn vaxsync_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ============================================================================
// Conflict Operations
// ============================================================================

/// Detect conflicts between two copies of a record.
///
/// # Returns
/// JSON string: `{"ok": [FieldConflict]}` or `{"error": "message"}`
///
/// # Safety
/// - `resolver` must be a valid pointer from `vaxsync_resolver_new` or null
/// - `local_json` and `server_json` must be valid null-terminated C strings or null
/// - Caller must free the returned string with `vaxsync_string_free`
#[no_mangle]
pub unsafe extern "C" fn vaxsync_detect_conflicts(
    resolver: *const Resolver,
    local_json: *const c_char,
    server_json: *const c_char,
) -> *mut c_char {
    respond((|| {
        let resolver = resolver_ref(resolver)?;
        let local: Record = parse_arg(local_json, "local record")?;
        let server: Record = parse_arg(server_json, "server record")?;
        Ok(resolver.detect(&local, &server))
    })())
}

/// Resolve two copies of a record into one.
///
/// # Arguments
/// - `strategy`: strategy name, or null for the resolver default
/// - `now`: resolution time in milliseconds since the epoch
///
/// # Returns
/// JSON string: `{"ok": Record}` or `{"error": "message"}`
///
/// # Safety
/// - `resolver` must be a valid pointer from `vaxsync_resolver_new` or null
/// - string arguments must be valid null-terminated C strings or null
/// - Caller must free the returned string with `vaxsync_string_free`
#[no_mangle]
pub unsafe extern "C" fn vaxsync_resolve_conflict(
    resolver: *const Resolver,
    local_json: *const c_char,
    server_json: *const c_char,
    strategy: *const c_char,
    now: Timestamp,
) -> *mut c_char {
    respond((|| {
        let resolver = resolver_ref(resolver)?;
        let local: Record = parse_arg(local_json, "local record")?;
        let server: Record = parse_arg(server_json, "server record")?;
        let strategy = strategy_arg(resolver, strategy);
        Ok(resolver.resolve(&local, &server, strategy, now))
    })())
}

/// Reconcile two datasets (JSON arrays of records).
///
/// # Returns
/// JSON string: `{"ok": ReconcileResult}` or `{"error": "message"}`
///
/// # Safety
/// - `resolver` must be a valid pointer from `vaxsync_resolver_new` or null
/// - string arguments must be valid null-terminated C strings or null
/// - Caller must free the returned string with `vaxsync_string_free`
#[no_mangle]
pub unsafe extern "C" fn vaxsync_reconcile(
    resolver: *const Resolver,
    local_json: *const c_char,
    server_json: *const c_char,
    strategy: *const c_char,
    now: Timestamp,
) -> *mut c_char {
    respond((|| {
        let resolver = resolver_ref(resolver)?;
        let local: Vec<Record> = parse_arg(local_json, "local dataset")?;
        let server: Vec<Record> = parse_arg(server_json, "server dataset")?;
        let strategy = strategy_arg(resolver, strategy);
        resolver
            .reconcile(&local, &server, strategy, now)
            .map_err(|e| e.to_string())
    })())
}

/// Classify a record pair from the members either side carries.
///
/// # Returns
/// JSON string: `{"ok": "child" | "vaccination" | ...}` or `{"error": "message"}`
///
/// # Safety
/// - `local_json` and `server_json` must be valid null-terminated C strings or null
/// - Caller must free the returned string with `vaxsync_string_free`
#[no_mangle]
pub unsafe extern "C" fn vaxsync_infer_kind(
    local_json: *const c_char,
    server_json: *const c_char,
) -> *mut c_char {
    respond((|| {
        let local: Record = parse_arg(local_json, "local record")?;
        let server: Record = parse_arg(server_json, "server record")?;
        Ok(RecordKind::infer_pair(&local, &server))
    })())
}

/// Get the engine version.
///
/// # Returns
/// Static string pointer (do not free)
#[no_mangle]
pub extern "C" fn vaxsync_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
