//! Cache Entry Module
//!
//! Defines individual cache entries: payload, TTL and the optional refresh
//! capability.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

/// Hook that regenerates a payload from its previous value.
pub type RefreshFn<V> = Arc<dyn Fn(&V) -> anyhow::Result<V> + Send + Sync>;

// == Time To Live ==
/// Requested lifetime of an entry, resolved once at insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Use the engine's configured default TTL
    Default,
    /// Never expires
    Forever,
    /// Expires once this much time has passed since creation (or last refresh)
    After(Duration),
}

impl Ttl {
    /// Resolves to a concrete lifetime, `None` meaning eternal.
    pub fn resolve(self, default_ttl: Duration) -> Option<Duration> {
        match self {
            Ttl::Default => Some(default_ttl),
            Ttl::Forever => None,
            Ttl::After(ttl) => Some(ttl),
        }
    }
}

impl From<Duration> for Ttl {
    fn from(ttl: Duration) -> Self {
        Ttl::After(ttl)
    }
}

// == Refresher ==
/// Refresh capability attached to an entry at insertion time.
pub struct Refresher<V> {
    hook: RefreshFn<V>,
    idle_timeout: Option<Duration>,
}

impl<V> Refresher<V> {
    /// Wraps a hook that computes a new payload from the current one.
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&V) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Self {
            hook: Arc::new(hook),
            idle_timeout: None,
        }
    }

    /// Overrides how long the entry may go unread before a stale copy is
    /// dropped instead of refreshed. Defaults to the sweep interval.
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }
}

impl<V> Clone for Refresher<V> {
    fn clone(&self) -> Self {
        Self {
            hook: Arc::clone(&self.hook),
            idle_timeout: self.idle_timeout,
        }
    }
}

impl<V> fmt::Debug for Refresher<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refresher")
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

struct Contents<V> {
    value: V,
    created_at: Instant,
}

struct RefreshState<V> {
    hook: RefreshFn<V>,
    idle_timeout: Option<Duration>,
    last_touched: Mutex<Instant>,
}

// == Cache Entry ==
/// A single cache entry with value and metadata.
///
/// Entries are shared as `Arc<CacheEntry<V>>` between the store and the
/// engine; the `Arc` pointer doubles as the entry's identity.
pub struct CacheEntry<V> {
    contents: RwLock<Contents<V>>,
    ttl: Option<Duration>,
    refresh: Option<RefreshState<V>>,
}

impl<V: Clone> CacheEntry<V> {
    // == Constructors ==
    /// Creates a plain entry. `ttl` of `None` never expires.
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        Self::new_at(value, ttl, None, Instant::now())
    }

    /// Creates an entry that can regenerate its payload when stale.
    pub fn refreshable(value: V, ttl: Option<Duration>, refresher: Refresher<V>) -> Self {
        Self::new_at(value, ttl, Some(refresher), Instant::now())
    }

    pub(crate) fn new_at(
        value: V,
        ttl: Option<Duration>,
        refresher: Option<Refresher<V>>,
        now: Instant,
    ) -> Self {
        Self {
            contents: RwLock::new(Contents {
                value,
                created_at: now,
            }),
            ttl,
            refresh: refresher.map(|r| RefreshState {
                hook: r.hook,
                idle_timeout: r.idle_timeout,
                last_touched: Mutex::new(now),
            }),
        }
    }

    // == Accessors ==
    /// Returns a copy of the current payload.
    pub fn value(&self) -> V {
        self.contents.read().value.clone()
    }

    /// When the payload was created or last refreshed.
    pub fn created_at(&self) -> Instant {
        self.contents.read().created_at
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn is_refreshable(&self) -> bool {
        self.refresh.is_some()
    }

    /// Last successful read, for refreshable entries only.
    pub fn last_touched(&self) -> Option<Instant> {
        self.refresh.as_ref().map(|r| *r.last_touched.lock())
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.refresh.as_ref().and_then(|r| r.idle_timeout)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its TTL at `now`.
    ///
    /// Boundary condition: an entry whose age equals its TTL is expired.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.created_at()) >= ttl,
            None => false,
        }
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`, or `None` for eternal entries.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining_at(&self, now: Instant) -> Option<Duration> {
        self.ttl.map(|ttl| {
            let age = now.saturating_duration_since(self.created_at());
            ttl.saturating_sub(age)
        })
    }

    /// True when a refreshable entry has not been read within its idle
    /// window. Plain entries are never considered untouched.
    pub fn is_untouched_at(&self, now: Instant, default_window: Duration) -> bool {
        match &self.refresh {
            Some(state) => {
                let window = state.idle_timeout.unwrap_or(default_window);
                now.saturating_duration_since(*state.last_touched.lock()) > window
            }
            None => false,
        }
    }

    // == Touch ==
    /// Records a read. No-op for plain entries.
    pub(crate) fn touch_at(&self, now: Instant) {
        if let Some(state) = &self.refresh {
            let mut last = state.last_touched.lock();
            if now > *last {
                *last = now;
            }
        }
    }

    // == Refresh ==
    /// Regenerates the payload and resets the creation time.
    ///
    /// The hook runs without holding the entry lock, so concurrent readers
    /// keep seeing the previous payload until it completes. A panicking
    /// hook is reported as an error.
    pub(crate) fn refresh(&self) -> anyhow::Result<()> {
        let Some(state) = &self.refresh else {
            anyhow::bail!("entry has no refresh hook");
        };
        let current = self.value();
        let fresh = panic::catch_unwind(AssertUnwindSafe(|| (state.hook)(&current))).map_err(
            |payload| anyhow::anyhow!("refresh hook panicked: {}", panic_message(payload.as_ref())),
        )??;

        let mut contents = self.contents.write();
        contents.value = fresh;
        contents.created_at = Instant::now();
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

impl<V: fmt::Debug> fmt::Debug for CacheEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contents = self.contents.read();
        f.debug_struct("CacheEntry")
            .field("value", &contents.value)
            .field("created_at", &contents.created_at)
            .field("ttl", &self.ttl)
            .field("refreshable", &self.refresh.is_some())
            .finish()
    }
}
