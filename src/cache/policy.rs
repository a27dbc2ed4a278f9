//! Staleness Policy
//!
//! Decides, for an entry at a given instant, whether it can be served,
//! should be refreshed, or should be dropped.

use std::time::{Duration, Instant};

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

/// Outcome of classifying an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Within its TTL (or eternal)
    Fresh,
    /// Expired, refreshable, and read recently enough to be worth refreshing
    StaleRefreshable,
    /// Expired and either plain or not read within its idle window
    StaleDead,
}

/// Pure classification rules shared by lookups and the sweeper.
#[derive(Debug, Clone, Copy)]
pub struct StalenessPolicy {
    touch_window: Duration,
}

impl StalenessPolicy {
    /// `touch_window` is how recently a refreshable entry must have been read
    /// for a stale copy to be refreshed; normally the sweep interval.
    pub fn new(touch_window: Duration) -> Result<Self> {
        if touch_window.is_zero() {
            return Err(CacheError::InvalidConfig(
                "touch window must be greater than zero".to_string(),
            ));
        }
        Ok(Self { touch_window })
    }

    pub fn touch_window(&self) -> Duration {
        self.touch_window
    }

    pub fn classify<V: Clone>(&self, entry: &CacheEntry<V>, now: Instant) -> Staleness {
        if !entry.is_expired_at(now) {
            return Staleness::Fresh;
        }
        if entry.is_refreshable() && !entry.is_untouched_at(now, self.touch_window) {
            Staleness::StaleRefreshable
        } else {
            Staleness::StaleDead
        }
    }
}
