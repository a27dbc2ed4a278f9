//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror. Cache misses are not
//! errors: lookups report absence through `Option`.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sweeper lifecycle misuse (e.g. started outside a runtime)
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// A refresh hook returned an error
    #[error("Refresh failed for key {key}: {source}")]
    RefreshFailed {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Payloads could not be serialized for size accounting
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
