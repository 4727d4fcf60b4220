//! Stake Record Types
//!
//! Rows of the stake record store and their read projection.

use serde::{Deserialize, Serialize};

use super::bytes::Bytes32;
use crate::catalog::{weighted_amount, StakeCategory};

/// One stake position as tracked by validating nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    /// Id of the locked coin (primary key)
    pub coin_id: Bytes32,
    /// Locked amount in mojo
    pub amount: u64,
    /// Height of the block that created the position
    pub confirmed_height: u32,
    /// Height of the block that spent it, 0 while unspent
    pub spent_height: u32,
    /// Destination the position routes rewards to
    pub stake_destination_hash: Bytes32,
    /// Owner the locked coin redeems to
    pub owner_puzzle_hash: Bytes32,
    /// Catalog tier index
    pub stake_type: u16,
    pub is_farm: bool,
    /// Coefficient copied from the catalog at creation
    pub coefficient: String,
    /// Absolute unix time the lock expires
    pub expiration: u64,
}

impl StakeRecord {
    pub fn category(&self) -> StakeCategory {
        StakeCategory::from_is_farm(self.is_farm)
    }

    pub fn is_spent(&self) -> bool {
        self.spent_height != 0
    }

    /// spent_height is either 0 or strictly after confirmation
    pub fn is_consistent(&self) -> bool {
        self.spent_height == 0 || self.spent_height > self.confirmed_height
    }

    pub fn is_expired(&self, as_of_timestamp: u64) -> bool {
        self.expiration <= as_of_timestamp
    }

    pub fn thin(&self) -> StakeRecordThin {
        StakeRecordThin {
            amount: self.amount,
            stake_destination_hash: self.stake_destination_hash,
            owner_puzzle_hash: self.owner_puzzle_hash,
            stake_type: self.stake_type,
            is_farm: self.is_farm,
            coefficient: self.coefficient.clone(),
            expiration: self.expiration,
        }
    }
}

/// Read projection used by reward distribution and membership queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecordThin {
    pub amount: u64,
    pub stake_destination_hash: Bytes32,
    pub owner_puzzle_hash: Bytes32,
    pub stake_type: u16,
    pub is_farm: bool,
    pub coefficient: String,
    pub expiration: u64,
}

impl StakeRecordThin {
    /// floor(amount * coefficient) using the stored coefficient
    pub fn weighted_amount(&self) -> u128 {
        weighted_amount(self.amount, &self.coefficient)
    }
}
