//! Storage Layer Module
//!
//! Provides persistence for stake records.
//!
//! This module contains:
//! - Storage trait definitions for abstraction
//! - SQLite implementation with read-through query caches

pub mod cache;
pub mod sqlite;
pub mod traits;

// Re-exports for convenience
pub use cache::{QueryCache, DEFAULT_CACHE_CAPACITY};
pub use sqlite::{SqliteStakeStore, LOCK_WINDOW_SKEW_SECS};
pub use traits::{StakeStore, StakeTotals, StorageError, StorageResult};
