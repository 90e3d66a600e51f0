//! Error types for the vaxsync engine.

use thiserror::Error;

/// All possible errors from the vaxsync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Input errors
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("record at position {0} has no id")]
    MissingRecordId(usize),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    // Persistence errors
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
