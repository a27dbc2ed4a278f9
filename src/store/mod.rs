//! Storage Backends
//!
//! The engine keeps its entries in any [`ValueStore`]. Two backends ship
//! with the crate: a concurrent hash map and an adapter over moka.

mod memory;
mod moka;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::CacheEntry;
use crate::config::Config;

pub use self::memory::MemoryStore;
pub use self::moka::MokaStore;

/// Keyed storage for cache entries.
///
/// Implementations must tolerate concurrent calls from any thread. Entries
/// are handed out as shared pointers; the engine alone mutates them.
pub trait ValueStore<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<CacheEntry<V>>>;

    /// Inserts or replaces the entry for `key`.
    fn put(&self, key: String, entry: Arc<CacheEntry<V>>);

    fn remove(&self, key: &str) -> Option<Arc<CacheEntry<V>>>;

    /// Removes `key` only while it still maps to `expected` (pointer
    /// identity). Returns whether a removal happened.
    fn remove_if_same(&self, key: &str, expected: &Arc<CacheEntry<V>>) -> bool;

    /// Snapshot of the keys currently held, in no particular order.
    fn keys(&self) -> Vec<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Selects a storage engine from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Moka,
}

impl StoreBackend {
    /// Builds the selected backend sized from `config`.
    pub fn build<V>(self, config: &Config) -> Arc<dyn ValueStore<V>>
    where
        V: Send + Sync + 'static,
    {
        match self {
            StoreBackend::Memory => Arc::new(MemoryStore::with_capacity(config.initial_capacity)),
            StoreBackend::Moka => Arc::new(MokaStore::new(
                config.initial_capacity,
                config.max_entries,
            )),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "moka" => Ok(StoreBackend::Moka),
            other => Err(format!("unknown cache backend: {other}")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Moka => write!(f, "moka"),
        }
    }
}
