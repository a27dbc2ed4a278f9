//! Refresh Cache - an in-process object cache
//!
//! Entries carry their own TTL and may regenerate themselves when stale.
//! Freshness is maintained lazily on read and proactively by a background
//! sweeper, over a pluggable storage backend.

pub mod cache;
pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod tasks;

pub use cache::{CacheEngine, CacheEntry, CacheStats, Refresher, Staleness, StalenessPolicy, Ttl};
pub use config::Config;
pub use error::{CacheError, Result};
pub use service::CacheService;
pub use store::{MemoryStore, MokaStore, StoreBackend, ValueStore};
pub use tasks::{SweepReport, Sweeper, SweeperState};
