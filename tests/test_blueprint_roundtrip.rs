//! Persisted strategy file round-trips through save/load, and lookups
//! against the resulting policy table behave as the live pipeline expects.

use std::collections::HashMap;

use headsup_engine::blueprint::{BlueprintPolicy, StrategyFile, StrategyMeta};
use headsup_engine::game::{Action, NUM_ACTIONS};

fn sample_meta() -> StrategyMeta {
    StrategyMeta {
        iterations: 1_000,
        seed: 7,
        small_blind: 1,
        big_blind: 2,
        start_stack: 200,
        max_raises: 3,
        equity_trials: 300,
        action_abstraction_version: "headsup-v1".to_string(),
        stopping_reason: "max_iterations".to_string(),
        checkpoints: Vec::new(),
    }
}

#[test]
fn strategy_file_round_trips_through_disk() {
    let mut policy = HashMap::new();
    policy.insert("street=pf|pos=btn|hs=7".to_string(), [0.125; NUM_ACTIONS]);

    let file = StrategyFile {
        meta: sample_meta(),
        policy,
    };

    let dir = std::env::temp_dir().join(format!("headsup-engine-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("blueprint.json");

    file.save(&path).unwrap();
    let loaded = StrategyFile::load(&path).unwrap();

    assert_eq!(loaded.meta.seed, 7);
    assert_eq!(loaded.policy.len(), 1);
    let probs = loaded.policy.get("street=pf|pos=btn|hs=7").unwrap();
    assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);

    std::fs::remove_file(&path).ok();
}

#[test]
fn rounded_truncates_to_eight_decimals() {
    let mut policy = HashMap::new();
    policy.insert(
        "k".to_string(),
        [0.333_333_333_333, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.666_666_666_667],
    );
    let file = StrategyFile {
        meta: sample_meta(),
        policy,
    };

    let rounded = file.rounded();
    let probs = rounded.policy.get("k").unwrap();
    assert_eq!(probs[0], 0.333_333_33);
}

#[test]
fn policy_lookup_misses_for_unknown_keys() {
    let file = StrategyFile {
        meta: sample_meta(),
        policy: HashMap::new(),
    };
    let blueprint = BlueprintPolicy::from_strategy_file(&file);
    assert!(blueprint.lookup("nonexistent-key").is_none());
    assert_eq!(blueprint.prior_for("nonexistent-key", Action::Fold), 0.0);
}
