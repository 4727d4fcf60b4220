//! Per-height stake reward planning
//!
//! Turns store queries into distributor inputs: farm members become one
//! weight per destination, maturing lock positions become one amount per
//! destination.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::distribution::{distribute_farm_rewards, distribute_lock_rewards};
use crate::logging::log_reward_event;
use crate::storage::{StakeStore, StorageResult};
use crate::types::{Bytes32, Coin};

/// Stake reward coins minted at one height
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakeRewards {
    pub farm: Vec<Coin>,
    pub lock: Vec<Coin>,
}

impl StakeRewards {
    pub fn coins(&self) -> impl Iterator<Item = &Coin> {
        self.farm.iter().chain(self.lock.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.farm.is_empty() && self.lock.is_empty()
    }
}

pub struct RewardPlanner<S: StakeStore + ?Sized> {
    store: Arc<S>,
    genesis_challenge: Bytes32,
}

impl<S: StakeStore + ?Sized> RewardPlanner<S> {
    pub fn new(store: Arc<S>, genesis_challenge: Bytes32) -> Self {
        Self {
            store,
            genesis_challenge,
        }
    }

    /// Total weight per farm destination; destinations with no weight are left out
    pub async fn farm_weights(
        &self,
        destinations: &[Bytes32],
        height: u32,
        timestamp: u64,
    ) -> StorageResult<BTreeMap<Bytes32, u128>> {
        let mut weights = BTreeMap::new();
        for destination in destinations {
            let members = self.store.farm_members(destination, height, timestamp).await?;
            let weight: u128 = members.iter().map(|m| m.weighted_amount()).sum();
            if weight > 0 {
                weights.insert(*destination, weight);
            }
        }
        Ok(weights)
    }

    /// Daily lock rewards due in the window, summed per destination
    pub async fn lock_amounts(
        &self,
        window_start: u64,
        window_end: u64,
    ) -> StorageResult<BTreeMap<Bytes32, u64>> {
        let members = self.store.lock_members(window_start, window_end).await?;

        let mut amounts: BTreeMap<Bytes32, u64> = BTreeMap::new();
        for member in &members {
            let reward = u64::try_from(member.weighted_amount()).unwrap_or(u64::MAX);
            let entry = amounts.entry(member.stake_destination_hash).or_insert(0);
            *entry = entry.saturating_add(reward);
        }
        amounts.retain(|_, amount| *amount > 0);
        Ok(amounts)
    }

    /// Stake reward coins for the block at `height`
    ///
    /// `destinations` are the farm destinations taking part in this block;
    /// `[window_start, window_end)` spans the previous and current block timestamps.
    pub async fn plan(
        &self,
        height: u32,
        destinations: &[Bytes32],
        window_start: u64,
        window_end: u64,
    ) -> StorageResult<StakeRewards> {
        let weights = self.farm_weights(destinations, height, window_end).await?;
        let farm = distribute_farm_rewards(&weights, height, &self.genesis_challenge);

        let amounts = self.lock_amounts(window_start, window_end).await?;
        let lock = distribute_lock_rewards(&amounts, height, &self.genesis_challenge);

        if !farm.is_empty() {
            log_reward_event("stake_farm", height, farm.len(), sum_amounts(&farm));
        }
        if !lock.is_empty() {
            log_reward_event("stake_lock", height, lock.len(), sum_amounts(&lock));
        }

        Ok(StakeRewards { farm, lock })
    }
}

fn sum_amounts(coins: &[Coin]) -> u64 {
    coins.iter().fold(0u64, |acc, c| acc.saturating_add(c.amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SECONDS_PER_DAY;
    use crate::rewards::schedule::stake_pool_reward;
    use crate::storage::SqliteStakeStore;
    use crate::types::StakeRecord;

    const GENESIS: Bytes32 = Bytes32([0x77; 32]);
    const HEIGHT: u32 = 2_500_000;

    fn record(n: u8, destination: Bytes32, is_farm: bool, amount: u64, expiration: u64) -> StakeRecord {
        StakeRecord {
            coin_id: Bytes32([n; 32]),
            amount,
            confirmed_height: 10,
            spent_height: 0,
            stake_destination_hash: destination,
            owner_puzzle_hash: Bytes32([n.wrapping_add(100); 32]),
            stake_type: 0,
            is_farm,
            coefficient: if is_farm { "2.0" } else { "0.0005" }.to_string(),
            expiration,
        }
    }

    async fn seeded_store() -> Arc<SqliteStakeStore> {
        let store = Arc::new(SqliteStakeStore::in_memory().unwrap());
        let far = 400 * SECONDS_PER_DAY;
        let records = vec![
            record(1, Bytes32([0xa1; 32]), true, 1_000, far),
            record(2, Bytes32([0xa1; 32]), true, 500, far),
            record(3, Bytes32([0xa2; 32]), true, 3_000, far),
            record(4, Bytes32([0xb1; 32]), false, 2_000_000, far + 1_500),
            record(5, Bytes32([0xb1; 32]), false, 1_000_000, far + 1_600),
            // maturing outside today's slot
            record(6, Bytes32([0xb2; 32]), false, 1_000_000, far + 50_000),
        ];
        store.apply_block(10, &records, &[]).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_farm_weights() {
        let planner = RewardPlanner::new(seeded_store().await, GENESIS);
        let destinations = [Bytes32([0xa1; 32]), Bytes32([0xa2; 32]), Bytes32([0xa3; 32])];

        let weights = planner.farm_weights(&destinations, HEIGHT, 1_000).await.unwrap();
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[&Bytes32([0xa1; 32])], 3_000);
        assert_eq!(weights[&Bytes32([0xa2; 32])], 6_000);
    }

    #[tokio::test]
    async fn test_lock_amounts() {
        let planner = RewardPlanner::new(seeded_store().await, GENESIS);

        let amounts = planner
            .lock_amounts(SECONDS_PER_DAY + 1_000, SECONDS_PER_DAY + 2_000)
            .await
            .unwrap();
        assert_eq!(amounts.len(), 1);
        assert_eq!(amounts[&Bytes32([0xb1; 32])], 1_000 + 500);
    }

    #[tokio::test]
    async fn test_plan_pays_full_pool_reward() {
        let planner = RewardPlanner::new(seeded_store().await, GENESIS);
        let destinations = [Bytes32([0xa1; 32]), Bytes32([0xa2; 32])];

        let rewards = planner
            .plan(HEIGHT, &destinations, SECONDS_PER_DAY + 1_000, SECONDS_PER_DAY + 2_000)
            .await
            .unwrap();

        let farm_total: u64 = rewards.farm.iter().map(|c| c.amount).sum();
        assert_eq!(farm_total, stake_pool_reward(HEIGHT));
        assert_eq!(rewards.farm[0].amount, stake_pool_reward(HEIGHT) / 3);
        assert_eq!(rewards.lock.len(), 1);
        assert_eq!(rewards.coins().count(), 3);
    }

    #[tokio::test]
    async fn test_plan_with_nothing_staked() {
        let store = Arc::new(SqliteStakeStore::in_memory().unwrap());
        let planner = RewardPlanner::new(store, GENESIS);

        let rewards = planner.plan(HEIGHT, &[Bytes32([1; 32])], 0, 100).await.unwrap();
        assert!(rewards.is_empty());
    }
}
