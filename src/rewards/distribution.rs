//! Stake reward distribution
//!
//! Destinations are iterated in ascending hash order (the `BTreeMap` order),
//! so every node produces the same coins in the same order.

use std::collections::BTreeMap;

use super::coinbase::{create_reward_coin, RewardKind};
use super::schedule::stake_pool_reward;
use crate::types::{Bytes32, Coin};

/// Split `stake_pool_reward(height)` across destinations pro rata by weight
///
/// Every destination but the last gets `floor(weight * total / sum)`; the last
/// gets whatever remains, so the coin amounts always add up to the total.
/// An empty map or an all-zero weight sum yields no coins.
pub fn distribute_farm_rewards(
    weights: &BTreeMap<Bytes32, u128>,
    height: u32,
    genesis_challenge: &Bytes32,
) -> Vec<Coin> {
    let total = stake_pool_reward(height);
    let weight_sum: u128 = weights.values().sum();
    if weight_sum == 0 {
        return Vec::new();
    }

    let last = weights.len() - 1;
    let mut balance = total;
    weights
        .iter()
        .enumerate()
        .map(|(index, (destination, weight))| {
            let amount = if index == last {
                balance
            } else {
                // weight <= weight_sum, so the share never exceeds total
                let share = (*weight * total as u128 / weight_sum) as u64;
                balance -= share;
                share
            };
            create_reward_coin(
                RewardKind::StakeFarm,
                height,
                *destination,
                amount,
                genesis_challenge,
            )
        })
        .collect()
}

/// One stake lock reward coin per destination for exactly its amount
pub fn distribute_lock_rewards(
    amounts: &BTreeMap<Bytes32, u64>,
    height: u32,
    genesis_challenge: &Bytes32,
) -> Vec<Coin> {
    amounts
        .iter()
        .map(|(destination, amount)| {
            create_reward_coin(
                RewardKind::StakeLock,
                height,
                *destination,
                *amount,
                genesis_challenge,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::coinbase::reward_parent_id;
    use proptest::prelude::*;

    const HEIGHT: u32 = 3_000_000;
    const GENESIS: Bytes32 = Bytes32([0x5a; 32]);

    #[test]
    fn test_uneven_split_remainder_goes_last() {
        let mut weights = BTreeMap::new();
        weights.insert(Bytes32([1; 32]), 1u128);
        weights.insert(Bytes32([2; 32]), 1);
        weights.insert(Bytes32([3; 32]), 1);

        let coins = distribute_farm_rewards(&weights, HEIGHT, &GENESIS);
        let total = stake_pool_reward(HEIGHT);
        assert_eq!(coins.len(), 3);
        assert_eq!(coins[0].amount, total / 3);
        assert_eq!(coins[1].amount, total / 3);
        assert_eq!(coins[2].amount, total - 2 * (total / 3));
        assert_eq!(coins[2].puzzle_hash, Bytes32([3; 32]));
        assert!(coins
            .iter()
            .all(|c| c.parent_coin_id == reward_parent_id(RewardKind::StakeFarm, HEIGHT, &GENESIS)));
    }

    #[test]
    fn test_empty_and_zero_weights() {
        assert!(distribute_farm_rewards(&BTreeMap::new(), HEIGHT, &GENESIS).is_empty());

        let mut zero = BTreeMap::new();
        zero.insert(Bytes32([1; 32]), 0u128);
        assert!(distribute_farm_rewards(&zero, HEIGHT, &GENESIS).is_empty());
    }

    #[test]
    fn test_before_bootstrap_height_amounts_are_zero() {
        let mut weights = BTreeMap::new();
        weights.insert(Bytes32([1; 32]), 10u128);
        let coins = distribute_farm_rewards(&weights, 100, &GENESIS);
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].amount, 0);
    }

    #[test]
    fn test_lock_rewards_one_coin_each() {
        let mut amounts = BTreeMap::new();
        amounts.insert(Bytes32([2; 32]), 250u64);
        amounts.insert(Bytes32([1; 32]), 100);

        let coins = distribute_lock_rewards(&amounts, 10, &GENESIS);
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0].puzzle_hash, Bytes32([1; 32]));
        assert_eq!(coins[0].amount, 100);
        assert_eq!(coins[1].amount, 250);
        assert_eq!(
            coins[0].parent_coin_id,
            reward_parent_id(RewardKind::StakeLock, 10, &GENESIS)
        );
    }

    proptest! {
        #[test]
        fn prop_farm_rewards_sum_to_pool_reward(
            weights in prop::collection::btree_map(
                any::<[u8; 32]>().prop_map(Bytes32),
                1u128..(u64::MAX as u128 * 4),
                1..40,
            ),
            height in 0u32..60_000_000,
        ) {
            let coins = distribute_farm_rewards(&weights, height, &GENESIS);
            let distributed: u64 = coins.iter().map(|c| c.amount).sum();
            prop_assert_eq!(coins.len(), weights.len());
            prop_assert_eq!(distributed, stake_pool_reward(height));
        }
    }
}
