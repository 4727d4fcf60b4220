//! Redemption Script Builder
//!
//! A stake coin is locked by `P2_1_OF_N` curried with the merkle root of its
//! redemption branches. Spending it reveals one branch plus its proof. The
//! only branch today pays the owner once `time_lock` seconds have passed.

use thiserror::Error;

use super::merkle::{MerkleProof, MerkleTree};
use super::metadata::{parse_metadata, MetadataError, StakeMetadata};
use super::puzzles::{augmented_condition_mod, augmented_condition_mod_hash, p2_1_of_n_mod, p2_1_of_n_mod_hash};
use crate::catalog::StakeCatalog;
use crate::logging::log_rejected_spend;
use crate::types::{curry_tree_hash, Bytes32, Coin, ConditionOpcode, Program, ProgramError, SpendConditions};

/// Redemption errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedemptionError {
    #[error("time lock must be at least 1 second, got {0}")]
    InvalidTimeLock(u64),

    #[error("inner puzzle hash {actual} does not match recipient {expected}")]
    InnerPuzzleMismatch { expected: Bytes32, actual: Bytes32 },

    #[error("coin puzzle hash {actual} is not the redemption puzzle {expected}")]
    CoinPuzzleMismatch { expected: Bytes32, actual: Bytes32 },

    #[error("no proof for branch {0}")]
    MissingProof(Bytes32),

    #[error("malformed stake metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("redemption puzzle {0} not among created coins")]
    PuzzleNotCreated(Bytes32),

    #[error("invalid script module: {0}")]
    Module(#[from] ProgramError),
}

impl RedemptionError {
    pub fn code(&self) -> &'static str {
        match self {
            RedemptionError::InvalidTimeLock(_) => "INVALID_TIME_LOCK",
            RedemptionError::InnerPuzzleMismatch { .. } => "INNER_PUZZLE_MISMATCH",
            RedemptionError::CoinPuzzleMismatch { .. } => "COIN_PUZZLE_MISMATCH",
            RedemptionError::MissingProof(_) => "MISSING_PROOF",
            RedemptionError::Metadata(_) => "METADATA_MALFORMED",
            RedemptionError::PuzzleNotCreated(_) => "PUZZLE_NOT_CREATED",
            RedemptionError::Module(_) => "INVALID_MODULE",
        }
    }
}

/// A way to release a stake coin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionBranch {
    /// Pay `recipient` after `time_lock` seconds
    Recipient { time_lock: u64, recipient: Bytes32 },
}

impl RedemptionBranch {
    /// `(80 time_lock)` prepended to the inner puzzle's conditions
    fn condition(&self) -> Program {
        match self {
            RedemptionBranch::Recipient { time_lock, .. } => Program::list([
                Program::int(ConditionOpcode::AssertSecondsRelative.as_u8() as i128),
                Program::int(*time_lock as i128),
            ]),
        }
    }

    fn inner_puzzle_hash(&self) -> Bytes32 {
        match self {
            RedemptionBranch::Recipient { recipient, .. } => *recipient,
        }
    }

    /// Tree hash of the augmented puzzle this branch reveals
    pub fn leaf_hash(&self) -> Bytes32 {
        curry_tree_hash(
            &augmented_condition_mod_hash(),
            &[self.condition().tree_hash(), self.inner_puzzle_hash()],
        )
    }

    /// The augmented puzzle wrapping `inner_puzzle`
    fn augmented_puzzle(&self, inner_puzzle: &Program) -> Program {
        augmented_condition_mod().curry(vec![self.condition(), inner_puzzle.clone()])
    }
}

#[derive(Debug, Clone)]
pub struct RedemptionTree {
    branches: Vec<RedemptionBranch>,
    merkle: MerkleTree,
}

impl RedemptionTree {
    pub fn new(branches: Vec<RedemptionBranch>) -> Option<Self> {
        let leaves: Vec<Bytes32> = branches.iter().map(RedemptionBranch::leaf_hash).collect();
        let merkle = MerkleTree::new(&leaves)?;
        Some(Self { branches, merkle })
    }

    pub fn branches(&self) -> &[RedemptionBranch] {
        &self.branches
    }

    pub fn root(&self) -> Bytes32 {
        self.merkle.root()
    }

    pub fn puzzle(&self) -> Result<Program, RedemptionError> {
        Ok(p2_1_of_n_mod()?.curry(vec![Program::hash(self.root())]))
    }

    pub fn puzzle_hash(&self) -> Bytes32 {
        curry_tree_hash(&p2_1_of_n_mod_hash(), &[Program::hash(self.root()).tree_hash()])
    }

    pub fn proof(&self, branch: &RedemptionBranch) -> Result<&MerkleProof, RedemptionError> {
        let leaf = branch.leaf_hash();
        self.merkle
            .proof(&leaf)
            .ok_or(RedemptionError::MissingProof(leaf))
    }
}

/// Redemption tree for a stake owned by `recipient`
pub fn build_redemption_tree(time_lock: u64, recipient: Bytes32) -> Result<RedemptionTree, RedemptionError> {
    if time_lock < 1 {
        return Err(RedemptionError::InvalidTimeLock(time_lock));
    }
    let branch = RedemptionBranch::Recipient {
        time_lock,
        recipient,
    };
    // a non-empty branch list always yields a tree
    RedemptionTree::new(vec![branch]).ok_or(RedemptionError::InvalidTimeLock(time_lock))
}

pub fn redemption_puzzle(time_lock: u64, recipient: Bytes32) -> Result<Program, RedemptionError> {
    build_redemption_tree(time_lock, recipient)?.puzzle()
}

pub fn redemption_puzzle_hash(time_lock: u64, recipient: Bytes32) -> Result<Bytes32, RedemptionError> {
    Ok(build_redemption_tree(time_lock, recipient)?.puzzle_hash())
}

/// Solution `(proof augmented_puzzle (inner_solution))` releasing the stake
pub fn build_solution(
    time_lock: u64,
    recipient: Bytes32,
    inner_puzzle: &Program,
    inner_solution: Program,
) -> Result<Program, RedemptionError> {
    let actual = inner_puzzle.tree_hash();
    if actual != recipient {
        return Err(RedemptionError::InnerPuzzleMismatch {
            expected: recipient,
            actual,
        });
    }

    let tree = build_redemption_tree(time_lock, recipient)?;
    let branch = RedemptionBranch::Recipient {
        time_lock,
        recipient,
    };
    let proof = tree.proof(&branch)?;

    Ok(Program::list([
        proof.to_program(),
        branch.augmented_puzzle(inner_puzzle),
        Program::list([inner_solution]),
    ]))
}

/// Redemption puzzle hash implied by `metadata`, if one of `created` carries it
pub fn match_stake_puzzle(
    metadata: &StakeMetadata,
    catalog: &StakeCatalog,
    created: &[Bytes32],
) -> Result<Bytes32, RedemptionError> {
    let expected = redemption_puzzle_hash(metadata.time_lock(catalog), metadata.owner_puzzle_hash)?;
    if created.contains(&expected) {
        Ok(expected)
    } else {
        Err(RedemptionError::PuzzleNotCreated(expected))
    }
}

/// Stake announced by `spend` together with the puzzle hash of its stake coins
///
/// Spends without stake metadata yield `None` silently. Spends whose metadata
/// is malformed or disagrees with the coins they create are logged and yield `None`.
pub fn match_stake_spend(spend: &SpendConditions, catalog: &StakeCatalog) -> Option<(StakeMetadata, Bytes32)> {
    let metadata = parse_metadata(spend)?;
    let created: Vec<Bytes32> = spend.create_coin.iter().map(|c| c.puzzle_hash).collect();

    match match_stake_puzzle(&metadata, catalog, &created) {
        Ok(puzzle_hash) => Some((metadata, puzzle_hash)),
        Err(e) => {
            log_rejected_spend(&spend.coin_id, e.code(), &e.to_string());
            None
        }
    }
}

/// A fully assembled stake coin spend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeSpend {
    pub coin: Coin,
    pub puzzle_reveal: Program,
    pub solution: Program,
}

/// Spend releasing a matured stake coin to its owner
pub fn build_spend(
    coin: Coin,
    metadata: &StakeMetadata,
    catalog: &StakeCatalog,
    inner_puzzle: &Program,
    inner_solution: Program,
) -> Result<StakeSpend, RedemptionError> {
    let time_lock = metadata.time_lock(catalog);
    let recipient = metadata.owner_puzzle_hash;
    let tree = build_redemption_tree(time_lock, recipient)?;

    let expected = tree.puzzle_hash();
    if coin.puzzle_hash != expected {
        return Err(RedemptionError::CoinPuzzleMismatch {
            expected,
            actual: coin.puzzle_hash,
        });
    }

    Ok(StakeSpend {
        coin,
        puzzle_reveal: tree.puzzle()?,
        solution: build_solution(time_lock, recipient, inner_puzzle, inner_solution)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SECONDS_PER_DAY;
    use crate::types::Condition;

    fn owner_puzzle() -> Program {
        Program::list([Program::int(1), Program::atom(b"owner".to_vec())])
    }

    fn metadata(owner: Bytes32) -> StakeMetadata {
        StakeMetadata {
            stake_type: 1,
            is_farm: false,
            stake_destination_hash: Bytes32([0xde; 32]),
            owner_puzzle_hash: owner,
        }
    }

    fn stake_creating_spend(metadata: &StakeMetadata, puzzle_hash: Bytes32) -> SpendConditions {
        SpendConditions::from_conditions(
            Bytes32([0x51; 32]),
            Bytes32([0x52; 32]),
            vec![
                Condition::create_coin(
                    puzzle_hash,
                    1_000,
                    vec![metadata.stake_destination_hash.0.to_vec()],
                ),
                Condition::create_coin(Bytes32([0x99; 32]), 5, vec![]),
                metadata.remark_condition(),
            ],
        )
    }

    #[test]
    fn test_time_lock_bounds() {
        let dest = Bytes32([0xd0; 32]);
        assert!(build_redemption_tree(1, dest).is_ok());
        assert_eq!(
            build_redemption_tree(0, dest).unwrap_err(),
            RedemptionError::InvalidTimeLock(0)
        );
    }

    #[test]
    fn test_puzzle_hash_matches_curried_puzzle() {
        let tree = build_redemption_tree(3_600, Bytes32([4; 32])).unwrap();
        assert_eq!(tree.puzzle().unwrap().tree_hash(), tree.puzzle_hash());

        let branch = tree.branches()[0];
        let augmented = branch.augmented_puzzle(&Program::nil());
        assert_ne!(augmented.tree_hash(), branch.leaf_hash());

        let proof = tree.proof(&branch).unwrap();
        assert_eq!(proof.root_for(&branch.leaf_hash()), tree.root());
    }

    #[test]
    fn test_redemption_puzzle_hash_known_answer() {
        let puzzle_hash = redemption_puzzle_hash(600, Bytes32([0x0a; 32])).unwrap();
        assert_eq!(
            hex::encode(puzzle_hash.as_bytes()),
            "6e0c3ccc20643ee14a9fa2e1eeea107ec72d58b1ecf9257478e73f51b44e9279"
        );
        assert_eq!(
            redemption_puzzle(600, Bytes32([0x0a; 32])).unwrap().tree_hash(),
            puzzle_hash
        );
    }

    #[test]
    fn test_solution_shape() {
        let inner = owner_puzzle();
        let recipient = inner.tree_hash();
        let solution = build_solution(600, recipient, &inner, Program::int(42)).unwrap();

        let parts: Vec<&Program> = solution.iter_list().collect();
        assert_eq!(parts.len(), 3);

        let branch = RedemptionBranch::Recipient {
            time_lock: 600,
            recipient,
        };
        assert_eq!(parts[1].tree_hash(), branch.leaf_hash());
        assert_eq!(parts[2], &Program::list([Program::int(42)]));
    }

    #[test]
    fn test_solution_rejects_wrong_inner_puzzle() {
        let inner = owner_puzzle();
        let err = build_solution(600, Bytes32([1; 32]), &inner, Program::nil()).unwrap_err();
        assert!(matches!(err, RedemptionError::InnerPuzzleMismatch { .. }));
        assert_eq!(err.code(), "INNER_PUZZLE_MISMATCH");
    }

    #[test]
    fn test_create_match_and_spend_round_trip() {
        let catalog = StakeCatalog::default();
        let inner = owner_puzzle();
        let metadata = metadata(inner.tree_hash());
        let time_lock = metadata.time_lock(&catalog);
        assert_eq!(time_lock, 30 * SECONDS_PER_DAY);

        let puzzle_hash = build_redemption_tree(time_lock, metadata.owner_puzzle_hash)
            .unwrap()
            .puzzle_hash();
        let spend = stake_creating_spend(&metadata, puzzle_hash);

        let (parsed, matched) = match_stake_spend(&spend, &catalog).unwrap();
        assert_eq!(parsed, metadata);
        assert_eq!(matched, puzzle_hash);
        assert_eq!(
            redemption_puzzle_hash(parsed.time_lock(&catalog), parsed.owner_puzzle_hash).unwrap(),
            puzzle_hash
        );

        let (coin, _) = spend.created_coins().next().unwrap();
        let stake_spend = build_spend(coin, &parsed, &catalog, &inner, Program::nil()).unwrap();
        assert_eq!(stake_spend.puzzle_reveal.tree_hash(), coin.puzzle_hash);
    }

    #[test]
    fn test_mismatched_metadata_is_not_matched() {
        let catalog = StakeCatalog::default();
        let metadata = metadata(Bytes32([7; 32]));

        // coin locked under a different tier
        let wrong = redemption_puzzle_hash(3 * SECONDS_PER_DAY, metadata.owner_puzzle_hash).unwrap();
        let spend = stake_creating_spend(&metadata, wrong);
        assert!(match_stake_spend(&spend, &catalog).is_none());

        let err = match_stake_puzzle(&metadata, &catalog, &[wrong]).unwrap_err();
        assert!(matches!(err, RedemptionError::PuzzleNotCreated(_)));
    }

    #[test]
    fn test_null_tier_cannot_be_matched() {
        let catalog = StakeCatalog::default();
        let metadata = StakeMetadata {
            stake_type: 500,
            ..metadata(Bytes32([7; 32]))
        };
        assert_eq!(
            match_stake_puzzle(&metadata, &catalog, &[]).unwrap_err(),
            RedemptionError::InvalidTimeLock(0)
        );
    }

    #[test]
    fn test_build_spend_refuses_foreign_coin() {
        let catalog = StakeCatalog::default();
        let inner = owner_puzzle();
        let metadata = metadata(inner.tree_hash());
        let coin = Coin::new(Bytes32([1; 32]), Bytes32([2; 32]), 10);

        let err = build_spend(coin, &metadata, &catalog, &inner, Program::nil()).unwrap_err();
        assert!(matches!(err, RedemptionError::CoinPuzzleMismatch { .. }));
    }
}
