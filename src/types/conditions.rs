//! Spend Conditions and Block Summaries
//!
//! The script interpreter turns each spend into a list of conditions. Consensus
//! hands us those lists, grouped per block, as a `StateChangeSummary`.

use serde::{Deserialize, Serialize};

use super::bytes::Bytes32;
use super::coin::Coin;
use super::program::{atom_to_u64, Program};

/// Condition opcodes the staking core reads or emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConditionOpcode {
    Remark = 1,
    CreateCoin = 51,
    AssertSecondsRelative = 80,
}

impl ConditionOpcode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A single output condition of a spend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub opcode: u8,
    pub args: Vec<Program>,
}

impl Condition {
    pub fn new(opcode: ConditionOpcode, args: Vec<Program>) -> Self {
        Self {
            opcode: opcode.as_u8(),
            args,
        }
    }

    pub fn is(&self, opcode: ConditionOpcode) -> bool {
        self.opcode == opcode.as_u8()
    }

    /// CREATE_COIN with an optional memo list
    pub fn create_coin(puzzle_hash: Bytes32, amount: u64, memos: Vec<Vec<u8>>) -> Self {
        let mut args = vec![Program::hash(puzzle_hash), Program::int(amount as i128)];
        if !memos.is_empty() {
            args.push(Program::list(memos.into_iter().map(Program::atom)));
        }
        Self::new(ConditionOpcode::CreateCoin, args)
    }

    /// Atom argument at `index`
    pub fn atom_arg(&self, index: usize) -> Option<&[u8]> {
        self.args.get(index).and_then(Program::as_atom)
    }

    /// Condition as the program `(opcode arg1 arg2 ...)`
    pub fn to_program(&self) -> Program {
        let mut items = vec![Program::int(self.opcode as i128)];
        items.extend(self.args.iter().cloned());
        Program::list(items)
    }
}

/// A coin created by a spend, with the hint taken from its first memo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCoin {
    pub puzzle_hash: Bytes32,
    pub amount: u64,
    pub hint: Option<Vec<u8>>,
}

/// Parsed result of one spend in a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendConditions {
    /// Id of the coin being spent (a removal)
    pub coin_id: Bytes32,
    /// Puzzle hash of the coin being spent
    pub puzzle_hash: Bytes32,
    /// Coins created by this spend
    pub create_coin: Vec<CreatedCoin>,
    /// Full condition list, in output order
    pub conditions: Vec<Condition>,
}

impl SpendConditions {
    /// Build from a raw condition list, extracting well-formed CREATE_COINs
    pub fn from_conditions(coin_id: Bytes32, puzzle_hash: Bytes32, conditions: Vec<Condition>) -> Self {
        let create_coin = conditions
            .iter()
            .filter(|c| c.is(ConditionOpcode::CreateCoin))
            .filter_map(|c| {
                let puzzle_hash = Bytes32::from_slice(c.atom_arg(0)?)?;
                let amount = atom_to_u64(c.atom_arg(1)?)?;
                let hint = c
                    .args
                    .get(2)
                    .and_then(|memos| memos.first())
                    .and_then(Program::as_atom)
                    .map(<[u8]>::to_vec);
                Some(CreatedCoin {
                    puzzle_hash,
                    amount,
                    hint,
                })
            })
            .collect();

        Self {
            coin_id,
            puzzle_hash,
            create_coin,
            conditions,
        }
    }

    /// Coins created by this spend, parented by the spent coin
    pub fn created_coins(&self) -> impl Iterator<Item = (Coin, Option<&[u8]>)> + '_ {
        self.create_coin.iter().map(move |created| {
            (
                Coin::new(self.coin_id, created.puzzle_hash, created.amount),
                created.hint.as_deref(),
            )
        })
    }
}

/// Net effect of one connected block, produced by consensus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateChangeSummary {
    pub spends: Vec<SpendConditions>,
    pub new_rewards: Vec<Coin>,
}

impl StateChangeSummary {
    /// Ids of every coin spent in the block
    pub fn removals(&self) -> Vec<Bytes32> {
        self.spends.iter().map(|s| s.coin_id).collect()
    }
}
