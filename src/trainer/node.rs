//! Flat-array node storage for the DCFR trainer: an interning table maps
//! infoset keys to a dense id, and regrets/strategy sums live in
//! contiguous arrays indexed by that id. Mirrors the teacher's flat CFR+
//! storage, generalized from a fixed preflop grid to arbitrary string keys.

use rustc_hash::FxHashMap;

use crate::game::{Action, ALL_ACTIONS, NUM_ACTIONS};

use super::discount::discount_regrets;

#[derive(Default)]
pub struct NodeTable {
    index: FxHashMap<String, usize>,
    regrets: Vec<[f64; NUM_ACTIONS]>,
    strategy_sum: Vec<[f64; NUM_ACTIONS]>,
    legal_mask: Vec<u8>,
    visits: Vec<u64>,
}

fn action_bit(action: Action) -> u8 {
    1 << action.index()
}

impl NodeTable {
    pub fn new() -> Self {
        NodeTable::default()
    }

    pub fn len(&self) -> usize {
        self.regrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regrets.is_empty()
    }

    pub fn memory_bytes(&self) -> usize {
        let per_node = std::mem::size_of::<[f64; NUM_ACTIONS]>() * 2
            + std::mem::size_of::<u8>()
            + std::mem::size_of::<u64>();
        self.index.len() * (std::mem::size_of::<String>() + std::mem::size_of::<usize>())
            + self.len() * per_node
    }

    /// Intern `key`, allocating fresh zeroed rows if it hasn't been seen.
    pub fn id_for(&mut self, key: &str) -> usize {
        if let Some(&id) = self.index.get(key) {
            return id;
        }
        let id = self.regrets.len();
        self.regrets.push([0.0; NUM_ACTIONS]);
        self.strategy_sum.push([0.0; NUM_ACTIONS]);
        self.legal_mask.push(0);
        self.visits.push(0);
        self.index.insert(key.to_string(), id);
        id
    }

    pub fn mark_legal(&mut self, id: usize, legal: &[Action]) {
        self.visits[id] += 1;
        for &a in legal {
            self.legal_mask[id] |= action_bit(a);
        }
    }

    /// Regret-matching current strategy over `legal`: proportional to
    /// positive regret, uniform if all regrets are non-positive.
    pub fn current_strategy(&self, id: usize, legal: &[Action]) -> [f64; NUM_ACTIONS] {
        let mut strategy = [0.0; NUM_ACTIONS];
        let regrets = &self.regrets[id];
        let positive_sum: f64 = legal.iter().map(|&a| regrets[a.index()].max(0.0)).sum();

        if positive_sum > 1e-12 {
            for &a in legal {
                strategy[a.index()] = regrets[a.index()].max(0.0) / positive_sum;
            }
        } else {
            let uniform = 1.0 / legal.len().max(1) as f64;
            for &a in legal {
                strategy[a.index()] = uniform;
            }
        }
        strategy
    }

    pub fn accumulate_strategy(&mut self, id: usize, strategy: &[f64; NUM_ACTIONS]) {
        let sum = &mut self.strategy_sum[id];
        for a in ALL_ACTIONS {
            sum[a.index()] += strategy[a.index()];
        }
    }

    pub fn add_regret(&mut self, id: usize, action: Action, delta: f64) {
        self.regrets[id][action.index()] += delta;
    }

    pub fn discount(&mut self, id: usize, t: f64) {
        discount_regrets(&mut self.regrets[id], t);
    }

    /// `strategy_sum` normalized into a probability vector; uniform over
    /// ever-legal actions if the node was never visited enough to
    /// accumulate any mass.
    pub fn average_strategy(&self, id: usize) -> [f64; NUM_ACTIONS] {
        let sum = &self.strategy_sum[id];
        let total: f64 = sum.iter().sum();
        if total > 1e-12 {
            let mut out = [0.0; NUM_ACTIONS];
            for i in 0..NUM_ACTIONS {
                out[i] = sum[i] / total;
            }
            return out;
        }
        let mask = self.legal_mask[id];
        let legal_count = (0..NUM_ACTIONS).filter(|&i| mask & (1 << i) != 0).count();
        let uniform = 1.0 / legal_count.max(1) as f64;
        let mut out = [0.0; NUM_ACTIONS];
        for i in 0..NUM_ACTIONS {
            if mask & (1 << i) != 0 {
                out[i] = uniform;
            }
        }
        out
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(|s| s.as_str())
    }

    pub fn id_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut table = NodeTable::new();
        let id1 = table.id_for("a");
        let id2 = table.id_for("a");
        assert_eq!(id1, id2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn uniform_strategy_with_no_regret() {
        let mut table = NodeTable::new();
        let id = table.id_for("k");
        let legal = vec![Action::Check, Action::BetHalf];
        let strategy = table.current_strategy(id, &legal);
        assert!((strategy[Action::Check.index()] - 0.5).abs() < 1e-9);
        assert!((strategy[Action::BetHalf.index()] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn average_strategy_sums_to_one_after_accumulation() {
        let mut table = NodeTable::new();
        let id = table.id_for("k");
        let legal = vec![Action::Check, Action::BetHalf];
        table.mark_legal(id, &legal);
        let s = table.current_strategy(id, &legal);
        table.accumulate_strategy(id, &s);
        let avg = table.average_strategy(id);
        let total: f64 = avg.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
