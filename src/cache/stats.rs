//! Cache Statistics Module
//!
//! Tracks hits, misses, evictions and refresh outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing, or found a dead entry
    pub misses: u64,
    /// Entries dropped because they were stale and could not be kept
    pub evictions: u64,
    /// Refreshes that brought a stale entry back to fresh
    pub refreshes: u64,
    /// Refreshes whose hook failed or panicked, or that left the entry stale
    pub refresh_failures: u64,
    /// Raw number of entries held by the store
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lock-free counters shared by callers and the sweeper.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            total_entries,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StatsRecorder::default().snapshot(0);
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let recorder = StatsRecorder::default();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_hit();
        assert_eq!(recorder.snapshot(0).hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let recorder = StatsRecorder::default();
        recorder.record_hit();
        recorder.record_miss();
        assert_eq!(recorder.snapshot(0).hit_rate(), 0.5);
    }

    #[test]
    fn test_refresh_counters() {
        let recorder = StatsRecorder::default();
        recorder.record_refresh();
        recorder.record_refresh_failure();
        recorder.record_refresh_failure();
        recorder.record_eviction();

        let stats = recorder.snapshot(3);
        assert_eq!(stats.refreshes, 1);
        assert_eq!(stats.refresh_failures, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 3);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats {
            hits: 2,
            ..CacheStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hits"], 2);
        assert_eq!(json["total_entries"], 0);
    }
}
