//! Cache Engine Module
//!
//! Orchestrates lookups, inserts and removals against a [`ValueStore`],
//! refreshing stale entries lazily on read and evicting dead ones.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats, Refresher, Staleness, StalenessPolicy, Ttl};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::ValueStore;
use crate::tasks::SweepReport;

// == Cache Engine ==
/// Keyed object cache with per-entry TTL and optional self-refresh.
///
/// All methods take `&self`; share the engine between threads with `Arc`.
/// Lookups never fail: a miss, an expired entry and a failed refresh all
/// surface as `None`.
pub struct CacheEngine<V> {
    store: Arc<dyn ValueStore<V>>,
    policy: StalenessPolicy,
    default_ttl: Duration,
    stats: StatsRecorder,
}

impl<V> CacheEngine<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates an engine over `store`, validating `config` up front.
    pub fn new(store: Arc<dyn ValueStore<V>>, config: &Config) -> Result<Self> {
        config.validate()?;
        let policy = StalenessPolicy::new(config.check_interval)?;

        info!(
            backend = store.name(),
            check_interval = ?config.check_interval,
            default_ttl = ?config.default_ttl,
            "Cache engine initialized"
        );

        Ok(Self {
            store,
            policy,
            default_ttl: config.default_ttl,
            stats: StatsRecorder::default(),
        })
    }

    /// Creates an engine over the backend named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.backend.build(config), config)
    }

    pub fn policy(&self) -> StalenessPolicy {
        self.policy
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any previous entry.
    pub fn put(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>) {
        let entry = CacheEntry::new(value, ttl.into().resolve(self.default_ttl));
        self.store.put(key.into(), Arc::new(entry));
    }

    /// Stores a refreshable entry. Its last-read time starts at creation, so
    /// it survives at least one sweep before it can be judged untouched.
    pub fn put_refreshable(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: impl Into<Ttl>,
        refresher: Refresher<V>,
    ) {
        let entry =
            CacheEntry::refreshable(value, ttl.into().resolve(self.default_ttl), refresher);
        self.store.put(key.into(), Arc::new(entry));
    }

    // == Get ==
    /// Returns a copy of the live value for `key`.
    ///
    /// A stale refreshable entry that was read recently is refreshed on the
    /// calling thread before returning. Dead entries are evicted.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.lookup(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Same liveness rules as [`get`](Self::get), without copying the value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    // == Remove ==
    /// Deletes `key` if present. Absent keys are ignored.
    pub fn remove(&self, key: &str) {
        self.store.remove(key);
    }

    /// Drops every entry.
    pub fn flush(&self) {
        self.store.clear();
        debug!(backend = self.store.name(), "Cache flushed");
    }

    // == Live Views ==
    /// Keys of entries that are fresh or were successfully refreshed.
    ///
    /// Runs the full lookup on every key, so dead entries found along the
    /// way are evicted and stale ones may be refreshed.
    pub fn keys(&self) -> Vec<String> {
        self.store
            .keys()
            .into_iter()
            .filter(|key| self.lookup(key).is_some())
            .collect()
    }

    /// Values of live entries, with the same side effects as [`keys`](Self::keys).
    pub fn values(&self) -> Vec<V> {
        self.store
            .keys()
            .into_iter()
            .filter_map(|key| self.lookup(&key))
            .map(|entry| entry.value())
            .collect()
    }

    // == Size ==
    /// Raw number of entries held by the store, stale ones included.
    pub fn size(&self) -> usize {
        self.store.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.store.len())
    }

    // == Sweep ==
    /// One sweeper pass over every key: dead entries are evicted, stale
    /// entries read within their idle window are refreshed, fresh entries
    /// are left alone.
    ///
    /// Cancellation is checked between keys.
    pub fn sweep(&self, cancel: &CancellationToken) -> SweepReport {
        let mut report = SweepReport::default();

        for key in self.store.keys() {
            if cancel.is_cancelled() {
                report.interrupted = true;
                break;
            }
            let Some(entry) = self.store.get(&key) else {
                continue;
            };
            report.examined += 1;

            match self.policy.classify(&entry, Instant::now()) {
                Staleness::Fresh => {}
                Staleness::StaleDead => {
                    if self.evict(&key, &entry) {
                        report.evicted += 1;
                    }
                }
                Staleness::StaleRefreshable => {
                    if self.refresh_entry(&key, &entry) {
                        report.refreshed += 1;
                    } else {
                        report.refresh_failures += 1;
                        if self.evict(&key, &entry) {
                            report.evicted += 1;
                        }
                    }
                }
            }
        }

        report
    }

    // == Internals ==
    fn lookup(&self, key: &str) -> Option<Arc<CacheEntry<V>>> {
        let entry = self.store.get(key)?;
        let now = Instant::now();

        match self.policy.classify(&entry, now) {
            Staleness::Fresh => {
                entry.touch_at(now);
                Some(entry)
            }
            Staleness::StaleRefreshable => {
                if self.refresh_entry(key, &entry) {
                    entry.touch_at(Instant::now());
                    Some(entry)
                } else {
                    self.evict(key, &entry);
                    None
                }
            }
            Staleness::StaleDead => {
                self.evict(key, &entry);
                None
            }
        }
    }

    /// Runs the refresh hook and reports whether the entry came back fresh.
    ///
    /// Only a refresh that leaves the entry fresh counts as one; a hook that
    /// errors, panics or returns a still-stale entry is a refresh failure.
    fn refresh_entry(&self, key: &str, entry: &CacheEntry<V>) -> bool {
        if let Err(source) = entry.refresh() {
            self.stats.record_refresh_failure();
            let err = CacheError::RefreshFailed {
                key: key.to_string(),
                source,
            };
            warn!(error = %err, "Dropping entry after failed refresh");
            return false;
        }

        if self.policy.classify(entry, Instant::now()) == Staleness::Fresh {
            self.stats.record_refresh();
            debug!(key, "Refreshed stale entry");
            true
        } else {
            self.stats.record_refresh_failure();
            debug!(key, "Entry still stale after refresh");
            false
        }
    }

    /// Removes `key` only if it still holds `entry`, so a concurrent `put`
    /// is never undone.
    fn evict(&self, key: &str, entry: &Arc<CacheEntry<V>>) -> bool {
        let removed = self.store.remove_if_same(key, entry);
        if removed {
            self.stats.record_eviction();
            debug!(key, "Evicted stale entry");
        }
        removed
    }
}

impl<V> CacheEngine<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    /// Approximate memory footprint: the JSON-encoded size of every held
    /// key and payload. Diagnostic only.
    pub fn approximate_size_bytes(&self) -> Result<usize> {
        let snapshot: BTreeMap<String, V> = self
            .store
            .keys()
            .into_iter()
            .filter_map(|key| self.store.get(&key).map(|entry| (key, entry.value())))
            .collect();
        Ok(serde_json::to_vec(&snapshot)?.len())
    }
}
