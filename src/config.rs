//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};
use crate::store::StoreBackend;

/// Default sweep frequency.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of slots reserved by the backing store.
pub const DEFAULT_INITIAL_CAPACITY: usize = 20;

/// Default time-to-live for entries stored with `Ttl::Default` (30 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interval between sweeper passes; also the "recently touched" window
    pub check_interval: Duration,
    /// Capacity hint for the backing store
    pub initial_capacity: usize,
    /// TTL applied to entries stored with `Ttl::Default`
    pub default_ttl: Duration,
    /// Which storage engine backs the cache
    pub backend: StoreBackend,
    /// Optional hard bound enforced by backends that support one (moka)
    pub max_entries: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    ///
    /// # Environment Variables
    /// - `CACHE_CHECK_INTERVAL` - Sweep frequency, humantime format (default: 5s)
    /// - `CACHE_INITIAL_CAPACITY` - Store capacity hint (default: 20)
    /// - `CACHE_DEFAULT_TTL` - Default TTL, humantime format (default: 30m)
    /// - `CACHE_BACKEND` - `memory` or `moka` (default: memory)
    /// - `CACHE_MAX_ENTRIES` - Size bound for the moka backend (default: unbounded)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            check_interval: lookup("CACHE_CHECK_INTERVAL")
                .and_then(|v| humantime::parse_duration(&v).ok())
                .unwrap_or(defaults.check_interval),
            initial_capacity: lookup("CACHE_INITIAL_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.initial_capacity),
            default_ttl: lookup("CACHE_DEFAULT_TTL")
                .and_then(|v| humantime::parse_duration(&v).ok())
                .unwrap_or(defaults.default_ttl),
            backend: lookup("CACHE_BACKEND")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backend),
            max_entries: lookup("CACHE_MAX_ENTRIES").and_then(|v| v.parse().ok()),
        }
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.check_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "check_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_entries == Some(0) {
            return Err(CacheError::InvalidConfig(
                "max_entries must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            default_ttl: DEFAULT_TTL,
            backend: StoreBackend::Memory,
            max_entries: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.check_interval, Duration::from_secs(5));
        assert_eq!(config.initial_capacity, 20);
        assert_eq!(config.default_ttl, Duration::from_secs(1800));
        assert_eq!(config.backend, StoreBackend::Memory);
        assert!(config.max_entries.is_none());
    }

    #[test]
    fn test_config_from_env_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.check_interval, DEFAULT_CHECK_INTERVAL);
        assert_eq!(config.initial_capacity, DEFAULT_INITIAL_CAPACITY);
        assert_eq!(config.default_ttl, DEFAULT_TTL);
        assert_eq!(config.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_config_from_env_values() {
        let config = config_from(&[
            ("CACHE_CHECK_INTERVAL", "250ms"),
            ("CACHE_INITIAL_CAPACITY", "64"),
            ("CACHE_DEFAULT_TTL", "2m"),
            ("CACHE_BACKEND", "moka"),
            ("CACHE_MAX_ENTRIES", "500"),
        ]);
        assert_eq!(config.check_interval, Duration::from_millis(250));
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.default_ttl, Duration::from_secs(120));
        assert_eq!(config.backend, StoreBackend::Moka);
        assert_eq!(config.max_entries, Some(500));
    }

    #[test]
    fn test_config_unparseable_values_fall_back() {
        let config = config_from(&[
            ("CACHE_CHECK_INTERVAL", "soon"),
            ("CACHE_INITIAL_CAPACITY", "-3"),
            ("CACHE_BACKEND", "redis"),
        ]);
        assert_eq!(config.check_interval, DEFAULT_CHECK_INTERVAL);
        assert_eq!(config.initial_capacity, DEFAULT_INITIAL_CAPACITY);
        assert_eq!(config.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = Config {
            check_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_max_entries() {
        let config = Config {
            max_entries: Some(0),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }
}
