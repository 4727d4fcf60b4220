//! Stake Redemption
//!
//! Builds and recognises the scripts that lock a stake coin until its tier's
//! time lock has elapsed.
//!
//! # Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    STAKE LIFECYCLE                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  1. Wallet creates the stake                                    │
//! │     └── CREATE_COIN to redemption_puzzle_hash(time_lock, owner) │
//! │     └── REMARK (3 versioned_metadata)                           │
//! │                                                                 │
//! │  2. Block indexer sees the spend                                │
//! │     └── match_stake_spend: rebuild puzzle hash, compare         │
//! │     └── Record stored with expiration = timestamp + time_lock   │
//! │                                                                 │
//! │  3. Owner redeems after the time lock                           │
//! │     └── build_spend: (proof augmented_puzzle (inner_solution))  │
//! │     └── Augmented puzzle asserts ASSERT_SECONDS_RELATIVE        │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use gbtc_stake::redemption::{build_spend, match_stake_spend};
//!
//! if let Some((metadata, puzzle_hash)) = match_stake_spend(&spend, &catalog) {
//!     // index the stake coins created under puzzle_hash
//! }
//!
//! let stake_spend = build_spend(coin, &metadata, &catalog, &owner_puzzle, owner_solution)?;
//! ```

pub mod builder;
pub mod merkle;
pub mod metadata;
pub mod puzzles;

pub use builder::{
    build_redemption_tree, build_solution, build_spend, match_stake_puzzle, match_stake_spend,
    redemption_puzzle, redemption_puzzle_hash, RedemptionBranch, RedemptionError, RedemptionTree,
    StakeSpend,
};
pub use merkle::{MerkleProof, MerkleTree};
pub use metadata::{
    find_metadata, parse_metadata, MetadataError, StakeMetadata, STAKE_METADATA_VERSION,
    STAKE_REMARK_TAG,
};
