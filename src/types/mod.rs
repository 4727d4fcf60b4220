//! Shared Types Module
//!
//! Ledger primitives and stake records shared across the staking core.

pub mod bytes;
pub mod coin;
pub mod conditions;
pub mod program;
pub mod stake;
pub mod units;

// Re-exports for convenience
pub use bytes::{sha256, Bytes32};
pub use coin::Coin;
pub use conditions::{
    Condition, ConditionOpcode, CreatedCoin, SpendConditions, StateChangeSummary,
};
pub use program::{curry_tree_hash, Program, ProgramError};
pub use stake::{StakeRecord, StakeRecordThin};
pub use units::{mojo_to_gbtc_string, MOJO_PER_GBTC};
