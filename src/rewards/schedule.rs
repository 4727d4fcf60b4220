//! Block reward schedule
//!
//! Piecewise-constant bands keyed by height. The block total is split 7/8 to
//! the pool and 1/8 to the farmer; every band total divides by 8, so both
//! shares are exact.

use crate::types::MOJO_PER_GBTC;

/// Bootstrap height below which stake farms earn nothing
pub const STAKE_REWARD_START_HEIGHT: u32 = 2_000_000;

/// One-time reward of the genesis block
pub const GENESIS_REWARD: u64 = 3_000_000 * MOJO_PER_GBTC;

/// (exclusive upper height, block total in mojo) for heights above 0
const BLOCK_REWARD_BANDS: [(u32, u64); 7] = [
    (1_000_000, MOJO_PER_GBTC),
    (2_000_000, MOJO_PER_GBTC / 10 * 6),
    (10_000_000, MOJO_PER_GBTC / 10 * 4),
    (20_000_000, MOJO_PER_GBTC / 10 * 2),
    (30_000_000, MOJO_PER_GBTC / 10),
    (40_000_000, MOJO_PER_GBTC / 100 * 5),
    (50_000_000, MOJO_PER_GBTC / 100 * 2),
];

const BLOCK_REWARD_TAIL: u64 = MOJO_PER_GBTC / 100;

/// (exclusive upper height, stake pool total in mojo) from the bootstrap height on
const STAKE_REWARD_BANDS: [(u32, u64); 5] = [
    (10_000_000, 5 * (MOJO_PER_GBTC / 10 * 4)),
    (20_000_000, 5 * (MOJO_PER_GBTC / 10 * 2)),
    (30_000_000, 5 * (MOJO_PER_GBTC / 10)),
    (40_000_000, 5 * (MOJO_PER_GBTC / 100 * 5)),
    (50_000_000, 5 * (MOJO_PER_GBTC / 100 * 2)),
];

const STAKE_REWARD_TAIL: u64 = 5 * (MOJO_PER_GBTC / 100);

fn band_value(bands: &[(u32, u64)], tail: u64, height: u32) -> u64 {
    bands
        .iter()
        .find(|(upper, _)| height < *upper)
        .map(|(_, value)| *value)
        .unwrap_or(tail)
}

/// Total block reward (pool plus farmer share)
pub fn block_reward_total(height: u32) -> u64 {
    if height == 0 {
        return GENESIS_REWARD;
    }
    band_value(&BLOCK_REWARD_BANDS, BLOCK_REWARD_TAIL, height)
}

/// Pool share: 7/8 of the block total
pub fn base_reward(height: u32) -> u64 {
    block_reward_total(height) / 8 * 7
}

/// Farmer share: 1/8 of the block total
pub fn farmer_reward(height: u32) -> u64 {
    block_reward_total(height) / 8
}

/// Reward shared by all stake farms at `height`
pub fn stake_pool_reward(height: u32) -> u64 {
    if height < STAKE_REWARD_START_HEIGHT {
        return 0;
    }
    band_value(&STAKE_REWARD_BANDS, STAKE_REWARD_TAIL, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_reward() {
        assert_eq!(base_reward(0), 2_625_000 * MOJO_PER_GBTC);
        assert_eq!(farmer_reward(0), 375_000 * MOJO_PER_GBTC);
    }

    #[test]
    fn test_band_values() {
        assert_eq!(base_reward(1), 875_000_000_000);
        assert_eq!(base_reward(999_999), 875_000_000_000);
        assert_eq!(base_reward(1_500_000), 525_000_000_000);
        assert_eq!(farmer_reward(1_500_000), 75_000_000_000);
        assert_eq!(base_reward(10_000_000), 175_000_000_000);
        assert_eq!(base_reward(49_999_999), 17_500_000_000);
        assert_eq!(base_reward(50_000_000), 8_750_000_000);
        assert_eq!(farmer_reward(u32::MAX), 1_250_000_000);
    }

    #[test]
    fn test_shares_sum_to_total_and_never_grow() {
        let checkpoints = [
            0u32, 1, 999_999, 1_000_000, 1_999_999, 2_000_000, 9_999_999, 10_000_000,
            19_999_999, 20_000_000, 29_999_999, 30_000_000, 39_999_999, 40_000_000,
            49_999_999, 50_000_000, u32::MAX,
        ];
        let mut previous = u64::MAX;
        for height in checkpoints {
            let total = block_reward_total(height);
            assert_eq!(base_reward(height) + farmer_reward(height), total);
            assert!(total <= previous, "reward grew at height {}", height);
            previous = total;
        }
    }

    #[test]
    fn test_stake_pool_reward() {
        assert_eq!(stake_pool_reward(0), 0);
        assert_eq!(stake_pool_reward(1_999_999), 0);
        assert_eq!(stake_pool_reward(2_000_000), 2 * MOJO_PER_GBTC);
        assert_eq!(stake_pool_reward(10_000_000), MOJO_PER_GBTC);
        assert_eq!(stake_pool_reward(20_000_000), 500_000_000_000);
        assert_eq!(stake_pool_reward(30_000_000), 250_000_000_000);
        assert_eq!(stake_pool_reward(40_000_000), 100_000_000_000);
        assert_eq!(stake_pool_reward(50_000_000), 50_000_000_000);
    }
}
