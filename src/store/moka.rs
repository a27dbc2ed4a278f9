//! Moka-backed store
//!
//! Adapts a `moka::sync::Cache` to [`ValueStore`] so the engine can sit on
//! top of an external cache library. Moka's own expiration is left off: the
//! engine decides staleness, moka only holds entries and (optionally)
//! enforces a size bound.

use std::sync::Arc;

use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;

use super::ValueStore;
use crate::cache::CacheEntry;

/// Store adapter over a moka cache.
pub struct MokaStore<V> {
    entries: Cache<String, Arc<CacheEntry<V>>>,
}

impl<V> MokaStore<V>
where
    V: Send + Sync + 'static,
{
    /// Creates the adapter. With `max_entries` set, moka evicts by its own
    /// frequency policy once the bound is reached.
    pub fn new(initial_capacity: usize, max_entries: Option<u64>) -> Self {
        tracing::info!(
            initial_capacity,
            ?max_entries,
            "Initializing moka-backed value store"
        );

        let mut builder = Cache::builder().initial_capacity(initial_capacity);
        if let Some(max_entries) = max_entries {
            builder = builder.max_capacity(max_entries);
        }

        Self {
            entries: builder.build(),
        }
    }
}

impl<V> ValueStore<V> for MokaStore<V>
where
    V: Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Option<Arc<CacheEntry<V>>> {
        self.entries.get(key)
    }

    fn put(&self, key: String, entry: Arc<CacheEntry<V>>) {
        self.entries.insert(key, entry);
    }

    fn remove(&self, key: &str) -> Option<Arc<CacheEntry<V>>> {
        self.entries.remove(key)
    }

    fn remove_if_same(&self, key: &str, expected: &Arc<CacheEntry<V>>) -> bool {
        let result = self
            .entries
            .entry_by_ref(key)
            .and_compute_with(|current| match current {
                Some(current) if Arc::ptr_eq(current.value(), expected) => Op::Remove,
                _ => Op::Nop,
            });
        matches!(result, CompResult::Removed(_))
    }

    fn keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(key, _)| key.as_ref().clone())
            .collect()
    }

    // entry_count() lags behind pending writes; iterating is exact.
    fn len(&self) -> usize {
        self.entries.iter().count()
    }

    fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    fn name(&self) -> &'static str {
        "moka"
    }
}
