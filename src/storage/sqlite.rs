//! SQLite Persistent Storage for Stake Records
//!
//! Durable, reorg-safe storage of every stake position. Uses connection
//! pooling via r2d2; every write runs inside a single transaction so readers
//! on other connections observe either the pre-block or post-block state.

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;

use super::cache::{QueryCache, DEFAULT_CACHE_CAPACITY};
use super::traits::{StakeStore, StakeTotals, StorageError, StorageResult};
use crate::catalog::STAKE_FARM_COUNT;
use crate::catalog::SECONDS_PER_DAY;
use crate::logging::log_store_event;
use crate::types::{Bytes32, StakeRecord, StakeRecordThin};

/// Offset applied to both ends of the daily lock maturity slot
pub const LOCK_WINDOW_SKEW_SECS: u64 = 300;

const RECORD_COLUMNS: &str = "coin_id, amount, confirmed_height, spent_height, \
     stake_destination_hash, owner_puzzle_hash, stake_type, is_farm, coefficient, expiration";

const THIN_COLUMNS: &str =
    "amount, stake_destination_hash, owner_puzzle_hash, stake_type, is_farm, coefficient, expiration";

type FarmKey = (Bytes32, u32);
type LockKey = (u64, u64);

/// SQLite-backed stake record store with connection pooling
pub struct SqliteStakeStore {
    pool: Pool<SqliteConnectionManager>,
    farm_cache: QueryCache<FarmKey, Vec<StakeRecordThin>>,
    lock_cache: QueryCache<LockKey, Vec<StakeRecordThin>>,
}

impl SqliteStakeStore {
    /// Create a new store with the given database path
    ///
    /// Creates the database file and runs migrations if needed.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        Self::with_cache_capacity(db_path, DEFAULT_CACHE_CAPACITY)
    }

    /// Like `new`, with an explicit capacity for each query cache
    pub fn with_cache_capacity<P: AsRef<Path>>(
        db_path: P,
        cache_capacity: usize,
    ) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
        });
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Self::from_pool(pool, cache_capacity)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Self::from_pool(pool, DEFAULT_CACHE_CAPACITY)
    }

    fn from_pool(
        pool: Pool<SqliteConnectionManager>,
        cache_capacity: usize,
    ) -> Result<Self, StorageError> {
        let store = Self {
            pool,
            farm_cache: QueryCache::new(cache_capacity),
            lock_cache: QueryCache::new(cache_capacity),
        };
        store.run_migrations()?;

        Ok(store)
    }

    /// Get a connection from the pool
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StorageError> {
        self.pool
            .get()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        tracing::info!(target: "gbtc::store", "Creating stake_record table and indexes");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS stake_record (
                coin_id BLOB PRIMARY KEY,
                amount INTEGER NOT NULL,
                confirmed_height INTEGER NOT NULL,
                spent_height INTEGER NOT NULL DEFAULT 0,
                stake_destination_hash BLOB NOT NULL,
                owner_puzzle_hash BLOB NOT NULL,
                stake_type INTEGER NOT NULL,
                is_farm INTEGER NOT NULL,
                coefficient TEXT NOT NULL,
                expiration INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_stake_confirmed_height ON stake_record(confirmed_height);
            CREATE INDEX IF NOT EXISTS idx_stake_spent_height ON stake_record(spent_height);
            CREATE INDEX IF NOT EXISTS idx_stake_type ON stake_record(stake_type);
            CREATE INDEX IF NOT EXISTS idx_stake_is_farm ON stake_record(is_farm);
            CREATE INDEX IF NOT EXISTS idx_stake_expiration ON stake_record(expiration);
            CREATE INDEX IF NOT EXISTS idx_stake_destination ON stake_record(stake_destination_hash);
            CREATE INDEX IF NOT EXISTS idx_stake_owner ON stake_record(owner_puzzle_hash);
            "#,
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    /// Convert a database row to StakeRecord
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<StakeRecord> {
        Ok(StakeRecord {
            coin_id: hash_column(row, "coin_id")?,
            amount: unsigned_column(row, "amount")?,
            confirmed_height: row.get("confirmed_height")?,
            spent_height: row.get("spent_height")?,
            stake_destination_hash: hash_column(row, "stake_destination_hash")?,
            owner_puzzle_hash: hash_column(row, "owner_puzzle_hash")?,
            stake_type: row.get("stake_type")?,
            is_farm: row.get("is_farm")?,
            coefficient: row.get("coefficient")?,
            expiration: unsigned_column(row, "expiration")?,
        })
    }

    /// Convert a database row to StakeRecordThin
    fn row_to_thin(row: &rusqlite::Row) -> rusqlite::Result<StakeRecordThin> {
        Ok(StakeRecordThin {
            amount: unsigned_column(row, "amount")?,
            stake_destination_hash: hash_column(row, "stake_destination_hash")?,
            owner_puzzle_hash: hash_column(row, "owner_puzzle_hash")?,
            stake_type: row.get("stake_type")?,
            is_farm: row.get("is_farm")?,
            coefficient: row.get("coefficient")?,
            expiration: unsigned_column(row, "expiration")?,
        })
    }

    /// Drop both query caches
    pub fn invalidate_caches(&self) {
        self.farm_cache.clear();
        self.lock_cache.clear();
    }

    // Synchronous helper methods for the trait implementations

    fn apply_block_sync(
        &self,
        height: u32,
        new_records: &[StakeRecord],
        spent_coin_ids: &[Bytes32],
    ) -> Result<(), StorageError> {
        if !spent_coin_ids.is_empty() && height == 0 {
            return Err(StorageError::InvalidArgument(
                "coins cannot be spent at height 0".to_string(),
            ));
        }
        if new_records.is_empty() && spent_coin_ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let mut marked_spent = 0usize;
        {
            let mut insert = tx
                .prepare_cached(&format!(
                    "INSERT INTO stake_record ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    RECORD_COLUMNS
                ))
                .map_err(|e| StorageError::Database(e.to_string()))?;

            for record in new_records {
                if !record.is_consistent() {
                    return Err(StorageError::InvalidData(format!(
                        "record {} spent at {} but confirmed at {}",
                        record.coin_id, record.spent_height, record.confirmed_height
                    )));
                }
                insert
                    .execute(params![
                        &record.coin_id.0[..],
                        to_sql_int(record.amount, "amount")?,
                        record.confirmed_height,
                        record.spent_height,
                        &record.stake_destination_hash.0[..],
                        &record.owner_puzzle_hash.0[..],
                        record.stake_type,
                        record.is_farm,
                        record.coefficient,
                        to_sql_int(record.expiration, "expiration")?,
                    ])
                    .map_err(|e| {
                        if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                            if err.extended_code == 1555 || err.extended_code == 2067 {
                                return StorageError::Duplicate(record.coin_id.to_hex());
                            }
                        }
                        StorageError::Database(e.to_string())
                    })?;
            }

            // Records confirmed in this same block are never marked spent by it
            let mut mark_spent = tx
                .prepare_cached(
                    "UPDATE stake_record SET spent_height = ?1 \
                     WHERE spent_height = 0 AND confirmed_height < ?1 AND coin_id = ?2",
                )
                .map_err(|e| StorageError::Database(e.to_string()))?;

            for coin_id in spent_coin_ids {
                marked_spent += mark_spent
                    .execute(params![height, &coin_id.0[..]])
                    .map_err(|e| StorageError::Database(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        log_store_event("apply_block", height as i64, new_records.len(), marked_spent);
        Ok(())
    }

    fn rollback_sync(&self, to_height: i64) -> Result<(), StorageError> {
        let result = self.rollback_tx(to_height);
        // Stale entries could report reverted spends, so drop them on any outcome
        self.invalidate_caches();

        let (deleted, unspent) = result?;
        log_store_event("rollback", to_height, deleted, unspent);
        Ok(())
    }

    fn rollback_tx(&self, to_height: i64) -> Result<(usize, usize), StorageError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let deleted = tx
            .execute(
                "DELETE FROM stake_record WHERE confirmed_height > ?1",
                params![to_height],
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let unspent = tx
            .execute(
                "UPDATE stake_record SET spent_height = 0 WHERE spent_height > ?1",
                params![to_height],
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok((deleted, unspent))
    }

    fn farm_membership_count_sync(
        &self,
        destination: &Bytes32,
        as_of_timestamp: u64,
    ) -> Result<u64, StorageError> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT owner_puzzle_hash) FROM stake_record \
                 WHERE stake_destination_hash = ?1 AND is_farm = 1 \
                 AND spent_height = 0 AND expiration > ?2",
                params![&destination.0[..], to_sql_int(as_of_timestamp, "as_of_timestamp")?],
                |row| row.get(0),
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    fn farm_members_sync(
        &self,
        destination: &Bytes32,
        below_height: u32,
        as_of_timestamp: u64,
    ) -> Result<Vec<StakeRecordThin>, StorageError> {
        let key = (*destination, below_height);
        let generation = self.farm_cache.generation();
        if let Some(members) = self.farm_cache.get(&key) {
            return Ok(members);
        }

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM stake_record \
                 WHERE stake_destination_hash = ?1 AND is_farm = 1 \
                 AND confirmed_height < ?2 AND expiration > ?3 \
                 ORDER BY confirmed_height, coin_id",
                THIN_COLUMNS
            ))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![
                    &destination.0[..],
                    below_height,
                    to_sql_int(as_of_timestamp, "as_of_timestamp")?
                ],
                Self::row_to_thin,
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let mut owners: HashSet<Bytes32> = HashSet::new();
        let mut members = Vec::new();
        for row in rows {
            let member = row.map_err(|e| StorageError::Database(e.to_string()))?;
            if owners.len() >= STAKE_FARM_COUNT && !owners.contains(&member.owner_puzzle_hash) {
                continue;
            }
            owners.insert(member.owner_puzzle_hash);
            members.push(member);
        }

        self.farm_cache.put(generation, key, members.clone());
        Ok(members)
    }

    fn lock_members_sync(
        &self,
        window_start: u64,
        window_end: u64,
    ) -> Result<Vec<StakeRecordThin>, StorageError> {
        let key = (window_start, window_end);
        let generation = self.lock_cache.generation();
        if let Some(members) = self.lock_cache.get(&key) {
            return Ok(members);
        }

        let slot_start = window_start % SECONDS_PER_DAY + LOCK_WINDOW_SKEW_SECS;
        let slot_end = window_end % SECONDS_PER_DAY + LOCK_WINDOW_SKEW_SECS;

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM stake_record \
                 WHERE is_farm = 0 AND spent_height = 0 AND expiration > ?1 \
                 AND expiration % {day} >= ?2 AND expiration % {day} < ?3 \
                 ORDER BY expiration, coin_id",
                THIN_COLUMNS,
                day = SECONDS_PER_DAY
            ))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let members = stmt
            .query_map(
                params![
                    to_sql_int(window_end, "window_end")?,
                    slot_start as i64,
                    slot_end as i64
                ],
                Self::row_to_thin,
            )
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        self.lock_cache.put(generation, key, members.clone());
        Ok(members)
    }

    fn aggregate_totals_sync(&self, as_of_timestamp: u64) -> Result<StakeTotals, StorageError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare_cached(
                "SELECT is_farm, COALESCE(SUM(amount), 0), \
                 COALESCE(SUM(amount * CAST(coefficient AS REAL)), 0.0) \
                 FROM stake_record WHERE expiration > ?1 GROUP BY is_farm",
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![to_sql_int(as_of_timestamp, "as_of_timestamp")?],
                |row| {
                    Ok((
                        row.get::<_, bool>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, f64>(2)?,
                    ))
                },
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let mut totals = StakeTotals::default();
        for row in rows {
            let (is_farm, amount, weighted) =
                row.map_err(|e| StorageError::Database(e.to_string()))?;
            if is_farm {
                totals.farm_total = amount as u64;
                totals.farm_weighted_total = weighted;
            } else {
                totals.lock_total = amount as u64;
            }
        }

        Ok(totals)
    }

    fn get_record_sync(&self, coin_id: &Bytes32) -> Result<Option<StakeRecord>, StorageError> {
        let conn = self.conn()?;

        conn.query_row(
            &format!("SELECT {} FROM stake_record WHERE coin_id = ?1", RECORD_COLUMNS),
            params![&coin_id.0[..]],
            Self::row_to_record,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn count_sync(&self) -> Result<u64, StorageError> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM stake_record", [], |row| row.get(0))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    #[cfg(test)]
    fn all_records_sync(&self) -> Result<Vec<StakeRecord>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM stake_record ORDER BY coin_id",
                RECORD_COLUMNS
            ))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let records = stmt
            .query_map([], Self::row_to_record)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(records)
    }
}

/// SQLite integers are signed 64-bit
fn to_sql_int(value: u64, field: &str) -> Result<i64, StorageError> {
    i64::try_from(value)
        .map_err(|_| StorageError::InvalidArgument(format!("{} {} exceeds i64", field, value)))
}

fn hash_column(row: &rusqlite::Row, name: &str) -> rusqlite::Result<Bytes32> {
    let bytes: Vec<u8> = row.get(name)?;
    Bytes32::from_slice(&bytes).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Blob,
            format!("{} is {} bytes, expected 32", name, bytes.len()).into(),
        )
    })
}

fn unsigned_column(row: &rusqlite::Row, name: &str) -> rusqlite::Result<u64> {
    let value: i64 = row.get(name)?;
    u64::try_from(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(e))
    })
}

#[async_trait]
impl StakeStore for SqliteStakeStore {
    async fn apply_block(
        &self,
        height: u32,
        new_records: &[StakeRecord],
        spent_coin_ids: &[Bytes32],
    ) -> StorageResult<()> {
        self.apply_block_sync(height, new_records, spent_coin_ids)
    }

    async fn rollback(&self, to_height: i64) -> StorageResult<()> {
        self.rollback_sync(to_height)
    }

    async fn farm_membership_count(
        &self,
        destination: &Bytes32,
        as_of_timestamp: u64,
    ) -> StorageResult<u64> {
        self.farm_membership_count_sync(destination, as_of_timestamp)
    }

    async fn farm_members(
        &self,
        destination: &Bytes32,
        below_height: u32,
        as_of_timestamp: u64,
    ) -> StorageResult<Vec<StakeRecordThin>> {
        self.farm_members_sync(destination, below_height, as_of_timestamp)
    }

    async fn lock_members(
        &self,
        window_start: u64,
        window_end: u64,
    ) -> StorageResult<Vec<StakeRecordThin>> {
        self.lock_members_sync(window_start, window_end)
    }

    async fn aggregate_totals(&self, as_of_timestamp: u64) -> StorageResult<StakeTotals> {
        self.aggregate_totals_sync(as_of_timestamp)
    }

    async fn get_record(&self, coin_id: &Bytes32) -> StorageResult<Option<StakeRecord>> {
        self.get_record_sync(coin_id)
    }

    async fn count(&self) -> StorageResult<u64> {
        self.count_sync()
    }
}
