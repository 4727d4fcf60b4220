//! Block Indexer
//!
//! Entry point consensus calls for each connected block: derives hints,
//! recognises stake-creating spends and applies the block's stake records and
//! removals to the store in one step.

use std::sync::Arc;

use crate::catalog::{StakeCatalog, StakeCategory};
use crate::common::Result;
use crate::config::StakeConfig;
use crate::hints::{derive, BlockHints};
use crate::logging::{EventCategory, LogEvent, LogLevel};
use crate::redemption::match_stake_spend;
use crate::storage::{SqliteStakeStore, StakeStore};
use crate::types::{Bytes32, StakeRecord, StateChangeSummary};

/// Outcome of connecting one block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectedBlock {
    /// Ids of the stake coins recorded by this block
    pub new_stakes: Vec<Bytes32>,
    pub hints: BlockHints,
}

pub struct BlockIndexer<S: StakeStore + ?Sized> {
    store: Arc<S>,
    catalog: Arc<StakeCatalog>,
}

impl BlockIndexer<SqliteStakeStore> {
    /// Open the configured database and catalog
    pub fn from_config(config: &StakeConfig) -> Result<Self> {
        let catalog = config.load_catalog()?;
        let store = SqliteStakeStore::with_cache_capacity(&config.db_path, config.cache_capacity)?;

        let event = LogEvent::new(LogLevel::Info, EventCategory::System, "stake indexer opened")
            .with_data(serde_json::json!({
                "network": format!("{:?}", config.network),
                "db_path": config.db_path.display().to_string(),
                "farm_tiers": catalog.tiers(StakeCategory::Farm).len(),
                "lock_tiers": catalog.tiers(StakeCategory::Lock).len(),
            }));
        tracing::info!(target: "gbtc::system", "{}", event.to_json());

        Ok(Self::new(Arc::new(store), Arc::new(catalog)))
    }
}

impl<S: StakeStore + ?Sized> BlockIndexer<S> {
    pub fn new(store: Arc<S>, catalog: Arc<StakeCatalog>) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Stake records created by the spends in `summary`
    ///
    /// Every coin a matched spend creates under the redemption puzzle hash
    /// becomes a record; other spends are skipped.
    pub fn stake_records(&self, height: u32, timestamp: u64, summary: &StateChangeSummary) -> Vec<StakeRecord> {
        let mut records = Vec::new();

        for spend in &summary.spends {
            let Some((metadata, puzzle_hash)) = match_stake_spend(spend, &self.catalog) else {
                continue;
            };
            let tier = metadata.stake_value(&self.catalog);

            for (coin, _) in spend.created_coins().filter(|(c, _)| c.puzzle_hash == puzzle_hash) {
                records.push(StakeRecord {
                    coin_id: coin.coin_id(),
                    amount: coin.amount,
                    confirmed_height: height,
                    spent_height: 0,
                    stake_destination_hash: metadata.stake_destination_hash,
                    owner_puzzle_hash: metadata.owner_puzzle_hash,
                    stake_type: metadata.stake_type,
                    is_farm: metadata.is_farm,
                    coefficient: tier.coefficient.to_string(),
                    expiration: timestamp.saturating_add(tier.time_lock),
                });
            }
        }

        records
    }

    /// Apply a connected block
    ///
    /// A storage failure is returned untouched; the block must not be marked
    /// connected.
    pub async fn connect_block<C, P>(
        &self,
        height: u32,
        timestamp: u64,
        summary: &StateChangeSummary,
        is_coin_watched: C,
        is_puzzle_hash_watched: P,
    ) -> Result<ConnectedBlock>
    where
        C: Fn(&Bytes32) -> bool,
        P: Fn(&Bytes32) -> bool,
    {
        let hints = derive(summary, is_coin_watched, is_puzzle_hash_watched);
        let records = self.stake_records(height, timestamp, summary);
        let removals = summary.removals();

        self.store.apply_block(height, &records, &removals).await?;

        Ok(ConnectedBlock {
            new_stakes: records.iter().map(|r| r.coin_id).collect(),
            hints,
        })
    }

    /// Undo every block above `to_height`
    pub async fn rollback(&self, to_height: i64) -> Result<()> {
        self.store.rollback(to_height).await?;
        Ok(())
    }
}
