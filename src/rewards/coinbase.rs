//! Reward coin construction
//!
//! Reward coins have no real parent. Their parent id is a 16-byte window of
//! the genesis challenge followed by the height as 16 big-endian bytes; each
//! reward kind uses its own window so coins of different kinds never collide.

use crate::types::{Bytes32, Coin};

/// Kinds of coins minted by the reward schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardKind {
    Pool,
    Farmer,
    StakeFarm,
    StakeLock,
}

impl RewardKind {
    /// Start offset of the genesis challenge window
    fn window_start(self) -> usize {
        match self {
            RewardKind::Pool => 0,
            RewardKind::Farmer => 16,
            RewardKind::StakeFarm => 8,
            RewardKind::StakeLock => 12,
        }
    }
}

/// Parent id of a reward coin of `kind` at `height`
pub fn reward_parent_id(kind: RewardKind, height: u32, genesis_challenge: &Bytes32) -> Bytes32 {
    let start = kind.window_start();
    let mut parent = [0u8; 32];
    parent[..16].copy_from_slice(&genesis_challenge.0[start..start + 16]);
    parent[16..].copy_from_slice(&(height as u128).to_be_bytes());
    Bytes32(parent)
}

pub fn create_reward_coin(
    kind: RewardKind,
    height: u32,
    puzzle_hash: Bytes32,
    amount: u64,
    genesis_challenge: &Bytes32,
) -> Coin {
    Coin::new(
        reward_parent_id(kind, height, genesis_challenge),
        puzzle_hash,
        amount,
    )
}

pub fn create_pool_coin(
    height: u32,
    puzzle_hash: Bytes32,
    amount: u64,
    genesis_challenge: &Bytes32,
) -> Coin {
    create_reward_coin(RewardKind::Pool, height, puzzle_hash, amount, genesis_challenge)
}

pub fn create_farmer_coin(
    height: u32,
    puzzle_hash: Bytes32,
    amount: u64,
    genesis_challenge: &Bytes32,
) -> Coin {
    create_reward_coin(RewardKind::Farmer, height, puzzle_hash, amount, genesis_challenge)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> Bytes32 {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        Bytes32(bytes)
    }

    #[test]
    fn test_parent_id_layout() {
        let parent = reward_parent_id(RewardKind::StakeLock, 0x0102, &genesis());
        assert_eq!(&parent.0[..16], &genesis().0[12..28]);
        assert_eq!(&parent.0[16..30], &[0u8; 14]);
        assert_eq!(&parent.0[30..], &[0x01, 0x02]);

        let pool = reward_parent_id(RewardKind::Pool, 7, &genesis());
        assert_eq!(&pool.0[..16], &genesis().0[..16]);
        let farmer = reward_parent_id(RewardKind::Farmer, 7, &genesis());
        assert_eq!(&farmer.0[..16], &genesis().0[16..]);
    }

    #[test]
    fn test_kinds_never_collide() {
        let kinds = [
            RewardKind::Pool,
            RewardKind::Farmer,
            RewardKind::StakeFarm,
            RewardKind::StakeLock,
        ];
        let ids: std::collections::HashSet<Bytes32> = kinds
            .iter()
            .map(|kind| reward_parent_id(*kind, 42, &genesis()))
            .collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_pool_and_farmer_coins() {
        let ph = Bytes32([9; 32]);
        let pool = create_pool_coin(5, ph, 100, &genesis());
        let farmer = create_farmer_coin(5, ph, 100, &genesis());
        assert_eq!(pool.puzzle_hash, ph);
        assert_eq!(pool.amount, 100);
        assert_ne!(pool.coin_id(), farmer.coin_id());
    }
}
