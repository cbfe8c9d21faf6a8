//! The persisted blueprint policy: infoset key → per-action probability
//! vector, plus the EV/prior blending used at runtime lookup (§4.6).

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::game::{Action, ALL_ACTIONS, NUM_ACTIONS};

pub const ACTION_ORDER: [Action; NUM_ACTIONS] = ALL_ACTIONS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub iter: u64,
    pub infoset_count: usize,
    pub throughput_per_sec: f64,
    pub memory_bytes: usize,
    pub drift: f64,
    pub eval_ev_by_profile: HashMap<String, f64>,
    pub eval_ev_aggregate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyMeta {
    pub iterations: u64,
    pub seed: u64,
    pub small_blind: i32,
    pub big_blind: i32,
    pub start_stack: i32,
    pub max_raises: u8,
    pub equity_trials: usize,
    pub action_abstraction_version: String,
    pub stopping_reason: String,
    pub checkpoints: Vec<CheckpointRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyFile {
    pub meta: StrategyMeta,
    pub policy: HashMap<String, [f64; NUM_ACTIONS]>,
}

impl StrategyFile {
    pub fn cache_path(dir: &std::path::Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.json"))
    }

    pub fn save(&self, path: &std::path::Path) -> EngineResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &std::path::Path) -> EngineResult<StrategyFile> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Round every probability to 8 decimals, as the external file format
    /// requires.
    pub fn rounded(mut self) -> Self {
        for probs in self.policy.values_mut() {
            for p in probs.iter_mut() {
                *p = (*p * 1e8).round() / 1e8;
            }
        }
        self
    }
}

/// Read-only lookup table used by the runtime decision pipeline. Distinct
/// from `StrategyFile` so the trainer's richer meta isn't dragged through
/// every lookup.
#[derive(Debug, Clone, Default)]
pub struct BlueprintPolicy {
    table: HashMap<String, [f64; NUM_ACTIONS]>,
}

impl BlueprintPolicy {
    pub fn from_strategy_file(file: &StrategyFile) -> Self {
        BlueprintPolicy {
            table: file.policy.clone(),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&[f64; NUM_ACTIONS]> {
        self.table.get(key)
    }

    pub fn prior_for(&self, key: &str, action: Action) -> f64 {
        self.table
            .get(key)
            .map(|probs| probs[action.index()])
            .unwrap_or(0.0)
    }
}

/// Score-blend EV against the log-prior, per §4.6, then convert to a
/// softmax distribution at `temperature`.
pub fn blend_scores(
    ev: &[(Action, f64)],
    prior: &dyn Fn(Action) -> f64,
    ev_blend: f64,
    floor: f64,
) -> Vec<(Action, f64)> {
    ev.iter()
        .map(|&(a, ev_a)| {
            let p = prior(a).max(floor);
            let score = ev_blend * ev_a + (1.0 - ev_blend) * p.ln();
            (a, score)
        })
        .collect()
}

pub fn softmax(scores: &[(Action, f64)], temperature: f64) -> Vec<(Action, f64)> {
    let t = temperature.max(1e-6);
    let max_score = scores.iter().map(|&(_, s)| s / t).fold(f64::MIN, f64::max);
    let exps: Vec<(Action, f64)> = scores
        .iter()
        .map(|&(a, s)| (a, (s / t - max_score).exp()))
        .collect();
    let total: f64 = exps.iter().map(|&(_, e)| e).sum::<f64>().max(1e-12);
    exps.into_iter().map(|(a, e)| (a, e / total)).collect()
}

/// Highest-probability action after blending, used for live decisions;
/// training samples from the same distribution instead.
pub fn best_blended_action(probs: &[(Action, f64)]) -> Option<Action> {
    probs
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|&(a, _)| a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_has_zero_prior() {
        let policy = BlueprintPolicy::default();
        assert_eq!(policy.prior_for("nope", Action::Call), 0.0);
    }

    #[test]
    fn softmax_sums_to_one() {
        let scores = vec![(Action::Fold, 0.1), (Action::Call, 0.9), (Action::AllIn, -0.3)];
        let probs = softmax(&scores, 0.3);
        let total: f64 = probs.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn higher_ev_action_wins_blend() {
        let ev = vec![(Action::Fold, 0.0), (Action::Call, 0.5), (Action::RaiseHalf, 0.6)];
        let prior = |a: Action| match a {
            Action::Fold => 0.1,
            Action::Call => 0.3,
            Action::RaiseHalf => 0.6,
            _ => 0.0,
        };
        let blended = blend_scores(&ev, &prior, 0.4, 1e-4);
        let probs = softmax(&blended, 0.3);
        let best = best_blended_action(&probs);
        assert_eq!(best, Some(Action::RaiseHalf));
    }
}
