//! GreenBTC Native Staking Core
//!
//! Consensus-side bookkeeping for stake positions. Users lock coins into
//! time-committed positions (pooled "farm" stakes and individual "lock"
//! stakes) and earn a share of newly minted block rewards.
//!
//! ## Components
//!
//! 1. **Stake Value Catalog** - Tier table of time locks and reward coefficients
//! 2. **Stake Record Store** - Reorg-safe SQLite store of every stake position
//! 3. **Reward Calculator** - Block reward schedule and pro-rata stake distribution
//! 4. **Redemption Script Builder** - Time-locked puzzles, proofs and solutions
//! 5. **Hint Filter** - Persisted hints and notify-now coin ids per block
//!
//! The [`indexer::BlockIndexer`] ties them together on block connection and
//! rollback; the [`rewards::RewardPlanner`] turns store queries into reward coins.

pub mod catalog;
pub mod common;
pub mod config;
pub mod hints;
pub mod indexer;
pub mod logging;
pub mod redemption;
pub mod rewards;
pub mod storage;
pub mod types;

// Re-exports: Catalog
pub use catalog::{StakeCatalog, StakeCategory, StakeValue};

// Re-exports: Errors and configuration
pub use common::{Result, StakeError};
pub use config::{Network, StakeConfig};

// Re-exports: Block connection
pub use hints::{derive as derive_hints, BlockHints};
pub use indexer::{BlockIndexer, ConnectedBlock};

// Re-exports: Rewards
pub use rewards::{
    base_reward, distribute_farm_rewards, distribute_lock_rewards, farmer_reward,
    stake_pool_reward, RewardPlanner, StakeRewards,
};

// Re-exports: Redemption
pub use redemption::{
    build_redemption_tree, build_solution, build_spend, match_stake_spend, parse_metadata,
    RedemptionError, StakeMetadata,
};

// Re-exports: Storage
pub use storage::{SqliteStakeStore, StakeStore, StakeTotals, StorageError};

// Re-exports: Types
pub use types::{Bytes32, Coin, Program, StakeRecord, StakeRecordThin, StateChangeSummary};
