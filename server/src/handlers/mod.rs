//! Request handlers for conflict and sync-state operations.

mod conflicts;
mod state;

pub use conflicts::*;
pub use state::*;

use vaxsync_engine::Timestamp;

/// Current wall-clock time in milliseconds since the epoch.
pub fn now_ms() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}
