//! In-memory store backed by a sharded concurrent hash map.

use std::sync::Arc;

use dashmap::DashMap;

use super::ValueStore;
use crate::cache::CacheEntry;

/// Concurrent map backend; the default store.
pub struct MemoryStore<V> {
    entries: DashMap<String, Arc<CacheEntry<V>>>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ValueStore<V> for MemoryStore<V>
where
    V: Send + Sync,
{
    fn get(&self, key: &str) -> Option<Arc<CacheEntry<V>>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn put(&self, key: String, entry: Arc<CacheEntry<V>>) {
        self.entries.insert(key, entry);
    }

    fn remove(&self, key: &str) -> Option<Arc<CacheEntry<V>>> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    fn remove_if_same(&self, key: &str, expected: &Arc<CacheEntry<V>>) -> bool {
        self.entries
            .remove_if(key, |_, current| Arc::ptr_eq(current, expected))
            .is_some()
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
