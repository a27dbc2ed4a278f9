//! Background Tasks Module
//!
//! Contains the sweeper that keeps the cache fresh between reads.
//!
//! # Tasks
//! - Sweeper: evicts dead entries and refreshes stale entries that are still being read

mod sweeper;

pub use sweeper::{SweepReport, Sweeper, SweeperState};
