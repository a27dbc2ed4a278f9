//! Cache Module
//!
//! Entries with per-entry TTL and optional refresh hooks, the staleness
//! rules applied to them, and the engine that serves reads and writes.

mod engine;
mod entry;
mod policy;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use engine::CacheEngine;
pub use entry::{CacheEntry, RefreshFn, Refresher, Ttl};
pub use policy::{Staleness, StalenessPolicy};
pub use stats::CacheStats;
