//! Storage Trait Definitions
//!
//! Defines the abstract interface of the stake record store. Block connection
//! and rollback go through it, as do the wallet/RPC read queries.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::types::{Bytes32, StakeRecord, StakeRecordThin};

/// Storage errors
///
/// Anything other than `InvalidArgument` means the store could not complete a
/// transaction, and block connection must halt.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl StorageError {
    /// Whether the error leaves the ledger view in an unknown state
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StorageError::InvalidArgument(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Unexpired stake totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StakeTotals {
    /// Sum of farm amounts
    pub farm_total: u64,
    /// Sum of farm amount * coefficient
    pub farm_weighted_total: f64,
    /// Sum of lock amounts
    pub lock_total: u64,
}

/// Stake record storage interface
///
/// Implementations:
/// - `SqliteStakeStore` - pooled SQLite with read-through query caches
#[async_trait]
pub trait StakeStore: Send + Sync {
    /// Insert the block's new records and mark its removals spent, atomically
    async fn apply_block(
        &self,
        height: u32,
        new_records: &[StakeRecord],
        spent_coin_ids: &[Bytes32],
    ) -> StorageResult<()>;

    /// Undo every block above `to_height`; negative values clear the table
    async fn rollback(&self, to_height: i64) -> StorageResult<()>;

    /// Distinct owners with an unspent, unexpired farm position at `destination`
    async fn farm_membership_count(
        &self,
        destination: &Bytes32,
        as_of_timestamp: u64,
    ) -> StorageResult<u64>;

    /// Farm positions at `destination`, bounded to `STAKE_FARM_COUNT` owners
    async fn farm_members(
        &self,
        destination: &Bytes32,
        below_height: u32,
        as_of_timestamp: u64,
    ) -> StorageResult<Vec<StakeRecordThin>>;

    /// Lock positions maturing in the daily slot of `[window_start, window_end)`
    async fn lock_members(
        &self,
        window_start: u64,
        window_end: u64,
    ) -> StorageResult<Vec<StakeRecordThin>>;

    /// Unexpired farm and lock totals
    async fn aggregate_totals(&self, as_of_timestamp: u64) -> StorageResult<StakeTotals>;

    /// Get a record by coin id
    async fn get_record(&self, coin_id: &Bytes32) -> StorageResult<Option<StakeRecord>>;

    /// Number of records, spent or not
    async fn count(&self) -> StorageResult<u64>;
}
