//! Checkpoint export: average-policy snapshot, L1 drift against the
//! previous snapshot, and the per-profile evaluation pass.

use std::collections::{HashMap, HashSet};

use crate::blueprint::CheckpointRecord;
use crate::game::NUM_ACTIONS;

use super::node::NodeTable;

pub fn export_policy(table: &NodeTable) -> HashMap<String, [f64; NUM_ACTIONS]> {
    table
        .keys()
        .map(|k| {
            let id = table.id_of(k).expect("key came from the table's own index");
            (k.to_string(), table.average_strategy(id))
        })
        .collect()
}

/// Average L1 distance between two policy snapshots over the union of
/// their keys; a key missing from one side is treated as the all-zero
/// vector.
pub fn l1_drift(
    prev: &HashMap<String, [f64; NUM_ACTIONS]>,
    curr: &HashMap<String, [f64; NUM_ACTIONS]>,
) -> f64 {
    let keys: HashSet<&String> = prev.keys().chain(curr.keys()).collect();
    if keys.is_empty() {
        return 0.0;
    }
    let total: f64 = keys
        .iter()
        .map(|k| {
            let p = prev.get(*k as &str).copied().unwrap_or([0.0; NUM_ACTIONS]);
            let c = curr.get(*k as &str).copied().unwrap_or([0.0; NUM_ACTIONS]);
            p.iter().zip(c.iter()).map(|(a, b)| (a - b).abs()).sum::<f64>()
        })
        .sum();
    total / keys.len() as f64
}

pub fn build_record(
    iter: u64,
    table: &NodeTable,
    throughput_per_sec: f64,
    drift: f64,
    eval_ev_by_profile: HashMap<String, f64>,
) -> CheckpointRecord {
    let eval_ev_aggregate = if eval_ev_by_profile.is_empty() {
        0.0
    } else {
        eval_ev_by_profile.values().sum::<f64>() / eval_ev_by_profile.len() as f64
    };
    CheckpointRecord {
        iter,
        infoset_count: table.len(),
        throughput_per_sec,
        memory_bytes: table.memory_bytes(),
        drift,
        eval_ev_by_profile,
        eval_ev_aggregate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_snapshots_have_zero_drift() {
        let mut snap = HashMap::new();
        snap.insert("k".to_string(), [0.25; NUM_ACTIONS]);
        assert_eq!(l1_drift(&snap, &snap), 0.0);
    }

    #[test]
    fn drift_is_positive_for_differing_snapshots() {
        let mut a = HashMap::new();
        a.insert("k".to_string(), [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let mut b = HashMap::new();
        b.insert("k".to_string(), [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(l1_drift(&a, &b) > 0.0);
    }
}
