//! Monte-Carlo equity estimation: hero hand vs. a random or specified opponent range.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::cards::{Card, Deck};
use crate::hand_evaluator::compare_hands;

#[derive(Debug, Clone, Copy)]
pub struct EquityResult {
    pub win: f64,
    pub tie: f64,
    pub lose: f64,
    pub simulations: u32,
}

impl EquityResult {
    pub fn equity(&self) -> f64 {
        self.win + self.tie / 2.0
    }
}

fn build_remaining_deck(dead: &[Card]) -> Deck {
    Deck::new(Some(dead))
}

/// Entries evicted once the cache reaches this size (§5 "eviction by
/// size threshold").
const EQUITY_CACHE_CAPACITY: usize = 4096;

static EQUITY_CACHE: Lazy<Mutex<HashMap<String, EquityResult>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Canonical cache key: sorted hero + sorted opponent (empty for a random
/// opponent) + sorted board, independent of input order, plus the trial
/// count the spec scopes the cache to.
fn canonical_key(hero: &[Card], opp: &[Card], board: &[Card], trials: u32) -> String {
    let sorted_notation = |cards: &[Card]| {
        let mut notations: Vec<String> = cards.iter().map(|c| c.to_string()).collect();
        notations.sort();
        notations.join("")
    };
    format!(
        "{}|{}|{}|{}",
        sorted_notation(hero),
        sorted_notation(opp),
        sorted_notation(board),
        trials
    )
}

fn cache_get(key: &str) -> Option<EquityResult> {
    EQUITY_CACHE.lock().expect("equity cache mutex poisoned").get(key).copied()
}

fn cache_insert(key: String, result: EquityResult) {
    let mut cache = EQUITY_CACHE.lock().expect("equity cache mutex poisoned");
    if cache.len() >= EQUITY_CACHE_CAPACITY {
        cache.clear();
    }
    cache.insert(key, result);
}

/// Number of entries currently cached; exposed for tests that verify
/// repeat queries hit the cache instead of re-running the rollout.
pub fn cache_len() -> usize {
    EQUITY_CACHE.lock().expect("equity cache mutex poisoned").len()
}

/// Hero vs. a uniformly random opponent hand, run over `trials` independent deals.
pub fn equity_vs_random(hero: &[Card], board: &[Card], trials: u32, seed: u64) -> EquityResult {
    let key = canonical_key(hero, &[], board, trials);
    if let Some(cached) = cache_get(&key) {
        return cached;
    }
    let result = equity_vs_random_uncached(hero, board, trials, seed);
    cache_insert(key, result);
    result
}

fn equity_vs_random_uncached(hero: &[Card], board: &[Card], trials: u32, seed: u64) -> EquityResult {
    let (win, tie, lose) = (0..trials)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let mut dead: Vec<Card> = Vec::with_capacity(hero.len() + board.len());
            dead.extend_from_slice(hero);
            dead.extend_from_slice(board);
            let mut deck = build_remaining_deck(&dead);
            deck.shuffle(&mut rng);

            let need_board = 5 - board.len();
            let villain = &deck.cards[0..2];
            let runout_start = 2;
            let runout: Vec<Card> = deck.cards[runout_start..runout_start + need_board].to_vec();

            let mut full_board = board.to_vec();
            full_board.extend(runout);

            match compare_hands(hero, villain, &full_board) {
                Ok(1) => (1u32, 0u32, 0u32),
                Ok(-1) => (0, 0, 1),
                Ok(_) => (0, 1, 0),
                Err(_) => (0, 0, 0),
            }
        })
        .reduce(
            || (0u32, 0u32, 0u32),
            |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2),
        );

    let total = (win + tie + lose).max(1) as f64;
    EquityResult {
        win: win as f64 / total,
        tie: tie as f64 / total,
        lose: lose as f64 / total,
        simulations: trials,
    }
}

/// Hero vs. one specific opponent hand, run over `trials` independent board runouts.
pub fn equity_vs_hand(
    hero: &[Card],
    villain: &[Card],
    board: &[Card],
    trials: u32,
    seed: u64,
) -> EquityResult {
    let need_board = 5 - board.len();
    if need_board == 0 {
        let cmp = compare_hands(hero, villain, board).unwrap_or(0);
        return EquityResult {
            win: if cmp == 1 { 1.0 } else { 0.0 },
            tie: if cmp == 0 { 1.0 } else { 0.0 },
            lose: if cmp == -1 { 1.0 } else { 0.0 },
            simulations: 1,
        };
    }

    let key = canonical_key(hero, villain, board, trials);
    if let Some(cached) = cache_get(&key) {
        return cached;
    }
    let result = equity_vs_hand_uncached(hero, villain, board, need_board, trials, seed);
    cache_insert(key, result);
    result
}

fn equity_vs_hand_uncached(
    hero: &[Card],
    villain: &[Card],
    board: &[Card],
    need_board: usize,
    trials: u32,
    seed: u64,
) -> EquityResult {
    let (win, tie, lose) = (0..trials)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let mut dead: Vec<Card> = Vec::with_capacity(hero.len() + villain.len() + board.len());
            dead.extend_from_slice(hero);
            dead.extend_from_slice(villain);
            dead.extend_from_slice(board);
            let mut deck = build_remaining_deck(&dead);
            deck.shuffle(&mut rng);

            let runout: Vec<Card> = deck.cards[0..need_board].to_vec();
            let mut full_board = board.to_vec();
            full_board.extend(runout);

            match compare_hands(hero, villain, &full_board) {
                Ok(1) => (1u32, 0u32, 0u32),
                Ok(-1) => (0, 0, 1),
                Ok(_) => (0, 1, 0),
                Err(_) => (0, 0, 0),
            }
        })
        .reduce(
            || (0u32, 0u32, 0u32),
            |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2),
        );

    let total = (win + tie + lose).max(1) as f64;
    EquityResult {
        win: win as f64 / total,
        tie: tie as f64 / total,
        lose: lose as f64 / total,
        simulations: trials,
    }
}

/// Clamp the trial count to a sane band so callers can't starve accuracy or
/// blow the per-decision time budget by passing an extreme value.
pub fn clamp_trials(requested: u32, min: u32, max: u32) -> u32 {
    requested.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_board;

    #[test]
    fn dominant_hand_has_majority_equity() {
        let hero = parse_board("AhAs").unwrap();
        let villain = parse_board("2c7d").unwrap();
        let board: Vec<Card> = vec![];
        let result = equity_vs_hand(&hero, &villain, &board, 400, 42);
        assert!(result.equity() > 0.75);
    }

    #[test]
    fn complete_board_resolves_without_sampling() {
        let hero = parse_board("AhKh").unwrap();
        let villain = parse_board("2c2d").unwrap();
        let board = parse_board("QhJhTh3c4d").unwrap();
        let result = equity_vs_hand(&hero, &villain, &board, 400, 7);
        assert_eq!(result.simulations, 1);
        assert!(result.equity() > 0.99);
    }

    #[test]
    fn equity_components_sum_to_one() {
        let hero = parse_board("7h7s").unwrap();
        let board: Vec<Card> = vec![];
        let result = equity_vs_random(&hero, &board, 300, 11);
        assert!((result.win + result.tie + result.lose - 1.0).abs() < 1e-6);
    }
}
