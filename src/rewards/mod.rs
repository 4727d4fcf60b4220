//! Reward Calculator
//!
//! Height-deterministic block reward schedule, reward coin construction and
//! pro-rata stake reward distribution. Every function here must produce
//! byte-identical results on every node.

pub mod coinbase;
pub mod distribution;
pub mod planner;
pub mod schedule;

pub use coinbase::{create_farmer_coin, create_pool_coin, reward_parent_id, RewardKind};
pub use distribution::{distribute_farm_rewards, distribute_lock_rewards};
pub use planner::{RewardPlanner, StakeRewards};
pub use schedule::{base_reward, block_reward_total, farmer_reward, stake_pool_reward};
