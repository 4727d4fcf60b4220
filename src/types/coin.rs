//! Coin Type
//!
//! A coin is identified by the hash of its parent, puzzle hash and amount.

use serde::{Deserialize, Serialize};

use super::bytes::{sha256, Bytes32};
use super::program::int_to_bytes;

/// An unspent output on the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub parent_coin_id: Bytes32,
    pub puzzle_hash: Bytes32,
    pub amount: u64,
}

impl Coin {
    pub fn new(parent_coin_id: Bytes32, puzzle_hash: Bytes32, amount: u64) -> Self {
        Self {
            parent_coin_id,
            puzzle_hash,
            amount,
        }
    }

    /// Coin id: sha256(parent || puzzle_hash || amount as minimal signed bytes)
    pub fn coin_id(&self) -> Bytes32 {
        let amount = int_to_bytes(self.amount as i128);
        sha256(&[
            self.parent_coin_id.as_ref(),
            self.puzzle_hash.as_ref(),
            &amount,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_id_depends_on_every_field() {
        let base = Coin::new(Bytes32([1; 32]), Bytes32([2; 32]), 1000);
        let other_parent = Coin::new(Bytes32([3; 32]), Bytes32([2; 32]), 1000);
        let other_ph = Coin::new(Bytes32([1; 32]), Bytes32([3; 32]), 1000);
        let other_amount = Coin::new(Bytes32([1; 32]), Bytes32([2; 32]), 1001);

        assert_ne!(base.coin_id(), other_parent.coin_id());
        assert_ne!(base.coin_id(), other_ph.coin_id());
        assert_ne!(base.coin_id(), other_amount.coin_id());
        assert_eq!(base.coin_id(), base.coin_id());
    }

    #[test]
    fn test_amount_uses_minimal_encoding() {
        // 128 needs a leading zero byte to stay positive
        let coin = Coin::new(Bytes32([1; 32]), Bytes32([2; 32]), 128);
        let expected = sha256(&[&[1u8; 32], &[2u8; 32], &[0x00, 0x80]]);
        assert_eq!(coin.coin_id(), expected);

        let zero = Coin::new(Bytes32([1; 32]), Bytes32([2; 32]), 0);
        assert_eq!(zero.coin_id(), sha256(&[&[1u8; 32], &[2u8; 32]]));
    }
}
