//! Hint / Subscription Filter
//!
//! Every hint attached to a new coin is persisted, whoever is listening, so a
//! wallet that subscribes to a puzzle hash later can still find coins hinted
//! to it. Separately, the coins that current subscribers care about are
//! collected for immediate notification.

use std::collections::BTreeSet;

use crate::logging::log_rejected_hint;
use crate::types::{Bytes32, StateChangeSummary};

/// Longest hint that is stored or matched
pub const MAX_HINT_LEN: usize = 32;

/// What one connected block means for light clients
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHints {
    /// `(coin_id, hint)` pairs to persist
    pub hints_to_persist: Vec<(Bytes32, Vec<u8>)>,
    /// Distinct coin ids to notify now, ascending
    pub coins_to_notify: Vec<Bytes32>,
}

/// Derive persisted hints and notify-now coin ids for a block
pub fn derive<C, P>(summary: &StateChangeSummary, is_coin_watched: C, is_puzzle_hash_watched: P) -> BlockHints
where
    C: Fn(&Bytes32) -> bool,
    P: Fn(&Bytes32) -> bool,
{
    let watched = |coin_id: &Bytes32, puzzle_hash: &Bytes32| {
        is_coin_watched(coin_id) || is_puzzle_hash_watched(puzzle_hash)
    };

    let mut hints_to_persist = Vec::new();
    let mut notify = BTreeSet::new();

    for spend in &summary.spends {
        if watched(&spend.coin_id, &spend.puzzle_hash) {
            notify.insert(spend.coin_id);
        }

        for (coin, hint) in spend.created_coins() {
            let coin_id = coin.coin_id();
            let hint = match hint {
                Some(h) if h.len() > MAX_HINT_LEN => {
                    log_rejected_hint(&coin_id, h.len());
                    None
                }
                Some(h) if !h.is_empty() => Some(h),
                _ => None,
            };

            let hinted_watch = hint
                .and_then(Bytes32::from_slice)
                .is_some_and(|h| is_puzzle_hash_watched(&h));
            if hinted_watch || watched(&coin_id, &coin.puzzle_hash) {
                notify.insert(coin_id);
            }

            if let Some(h) = hint {
                hints_to_persist.push((coin_id, h.to_vec()));
            }
        }
    }

    for reward in &summary.new_rewards {
        let coin_id = reward.coin_id();
        if watched(&coin_id, &reward.puzzle_hash) {
            notify.insert(coin_id);
        }
    }

    BlockHints {
        hints_to_persist,
        coins_to_notify: notify.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coin, Condition, SpendConditions};
    use std::collections::HashSet;

    fn spend(coin_id: u8, puzzle_hash: u8, creates: Vec<Condition>) -> SpendConditions {
        SpendConditions::from_conditions(Bytes32([coin_id; 32]), Bytes32([puzzle_hash; 32]), creates)
    }

    #[test]
    fn test_hint_matches_late_subscription() {
        let watched_ph = Bytes32([0xaa; 32]);
        let summary = StateChangeSummary {
            spends: vec![spend(
                1,
                2,
                vec![Condition::create_coin(Bytes32([3; 32]), 100, vec![watched_ph.0.to_vec()])],
            )],
            new_rewards: vec![],
        };
        let created = Coin::new(Bytes32([1; 32]), Bytes32([3; 32]), 100).coin_id();

        let result = derive(&summary, |_| false, |ph| *ph == watched_ph);
        assert_eq!(result.coins_to_notify, vec![created]);
        assert_eq!(result.hints_to_persist, vec![(created, watched_ph.0.to_vec())]);
    }

    #[test]
    fn test_hints_persist_without_subscribers() {
        let summary = StateChangeSummary {
            spends: vec![spend(
                1,
                2,
                vec![
                    Condition::create_coin(Bytes32([3; 32]), 1, vec![b"short".to_vec()]),
                    Condition::create_coin(Bytes32([4; 32]), 2, vec![vec![]]),
                    Condition::create_coin(Bytes32([5; 32]), 3, vec![]),
                ],
            )],
            new_rewards: vec![],
        };

        let result = derive(&summary, |_| false, |_| false);
        assert!(result.coins_to_notify.is_empty());
        assert_eq!(result.hints_to_persist.len(), 1);
        assert_eq!(result.hints_to_persist[0].1, b"short".to_vec());
    }

    #[test]
    fn test_oversized_hint_rejected() {
        let watched_ph = Bytes32([0xaa; 32]);
        let mut long = watched_ph.0.to_vec();
        long.push(0);
        let summary = StateChangeSummary {
            spends: vec![spend(1, 2, vec![Condition::create_coin(Bytes32([3; 32]), 1, vec![long])])],
            new_rewards: vec![],
        };

        let result = derive(&summary, |_| false, |ph| *ph == watched_ph);
        assert!(result.hints_to_persist.is_empty());
        assert!(result.coins_to_notify.is_empty());
    }

    #[test]
    fn test_removals_and_rewards_notify_distinct() {
        let reward = Coin::new(Bytes32([9; 32]), Bytes32([0xbb; 32]), 50);
        let removed_a = spend(1, 0xbb, vec![]);
        let removed_b = spend(7, 8, vec![]);
        let summary = StateChangeSummary {
            spends: vec![removed_a, removed_b.clone(), removed_b],
            new_rewards: vec![reward],
        };

        let coins: HashSet<Bytes32> = [Bytes32([7; 32])].into_iter().collect();
        let result = derive(&summary, |id| coins.contains(id), |ph| *ph == Bytes32([0xbb; 32]));

        let mut expected = vec![Bytes32([1; 32]), Bytes32([7; 32]), reward.coin_id()];
        expected.sort();
        assert_eq!(result.coins_to_notify, expected);
    }
}
