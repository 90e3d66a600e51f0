//! Configuration management for the server.

use std::env;
use vaxsync_engine::config::DEFAULT_LOG_CAPACITY;
use vaxsync_engine::{ResolverConfig, StorageKeys, Strategy};

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Detection and resolution settings
    pub resolver: ResolverConfig,
    /// Maximum conflict log entries kept
    pub log_capacity: usize,
    /// Persisted key names
    pub keys: StorageKeys,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            resolver: ResolverConfig::default(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            keys: StorageKeys::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort)?,
            None => defaults.port,
        };

        let mut resolver = defaults.resolver;
        if let Some(raw) = lookup("DEFAULT_STRATEGY") {
            resolver.default_strategy = raw
                .parse::<Strategy>()
                .map_err(|_| ConfigError::InvalidStrategy(raw))?;
        }
        if let Some(raw) = lookup("TIMESTAMP_THRESHOLD_MS") {
            resolver.timestamp_threshold_ms = raw
                .parse()
                .ok()
                .filter(|ms: &i64| *ms >= 0)
                .ok_or(ConfigError::InvalidThreshold)?;
        }

        let log_capacity = match lookup("CONFLICT_LOG_CAPACITY") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidLogCapacity)?,
            None => defaults.log_capacity,
        };

        Ok(Self {
            host,
            port,
            resolver,
            log_capacity,
            keys: defaults.keys,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Unknown DEFAULT_STRATEGY: {0}")]
    InvalidStrategy(String),

    #[error("Invalid TIMESTAMP_THRESHOLD_MS value")]
    InvalidThreshold,

    #[error("Invalid CONFLICT_LOG_CAPACITY value")]
    InvalidLogCapacity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.resolver.default_strategy, Strategy::LastWriteWins);
        assert_eq!(config.resolver.timestamp_threshold_ms, 5000);
        assert_eq!(config.log_capacity, 100);
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DEFAULT_STRATEGY", "custom"),
            ("TIMESTAMP_THRESHOLD_MS", "60000"),
            ("CONFLICT_LOG_CAPACITY", "10"),
        ])
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.resolver.default_strategy, Strategy::Custom);
        assert_eq!(config.resolver.timestamp_threshold_ms, 60_000);
        assert_eq!(config.log_capacity, 10);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(load(&[("PORT", "http")]), Err(ConfigError::InvalidPort)));
        assert!(matches!(
            load(&[("DEFAULT_STRATEGY", "newest")]),
            Err(ConfigError::InvalidStrategy(s)) if s == "newest"
        ));
        assert!(matches!(
            load(&[("TIMESTAMP_THRESHOLD_MS", "-1")]),
            Err(ConfigError::InvalidThreshold)
        ));
        assert!(matches!(
            load(&[("CONFLICT_LOG_CAPACITY", "lots")]),
            Err(ConfigError::InvalidLogCapacity)
        ));
    }
}
