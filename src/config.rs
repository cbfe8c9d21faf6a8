//! Central tunables (spec §6), shared by the trainer and the runtime engine
//! so both binaries and the test suite build off one source of truth.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub start_stack: i32,
    pub small_blind: i32,
    pub big_blind: i32,
    pub max_raises: u8,

    pub equity_trials_train: usize,
    pub equity_trials_eval: usize,

    pub rt_subgame_ms: u64,
    pub rt_subgame_depth: usize,
    pub rt_trigger_pot: i32,
    pub rt_trigger_spr: f64,
    pub rt_prior_weight: f64,

    pub ev_blend: f64,
    pub prob_floor: f64,

    pub drift_plateau: f64,
    pub ev_plateau: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            start_stack: 200,
            small_blind: 1,
            big_blind: 2,
            max_raises: 3,

            equity_trials_train: 180,
            equity_trials_eval: 600,

            rt_subgame_ms: 300,
            rt_subgame_depth: 5,
            rt_trigger_pot: 60,
            rt_trigger_spr: 4.0,
            rt_prior_weight: 0.65,

            ev_blend: 0.4,
            prob_floor: 1e-4,

            drift_plateau: 0.015,
            ev_plateau: 0.02,
        }
    }
}

impl EngineConfig {
    /// Overlay values from environment variables (`HU_ENGINE_*`), falling
    /// back to whatever `self` already holds. Mirrors the teacher's
    /// `std::env::var(...).unwrap_or_else(...)` idiom for cache-dir resolution.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("HU_ENGINE_EQUITY_TRIALS_EVAL") {
            if let Ok(n) = v.parse() {
                self.equity_trials_eval = n;
            }
        }
        if let Ok(v) = std::env::var("HU_ENGINE_RT_SUBGAME_MS") {
            if let Ok(n) = v.parse() {
                self.rt_subgame_ms = n;
            }
        }
        if let Ok(v) = std::env::var("HU_ENGINE_MAX_RAISES") {
            if let Ok(n) = v.parse() {
                self.max_raises = n;
            }
        }
        self
    }

    pub fn equity_trials_train_clamped(&self, requested: usize) -> usize {
        requested.clamp(100, 300)
    }

    pub fn equity_trials_eval_clamped(&self, requested: usize) -> usize {
        requested.clamp(100, 2000)
    }

    pub fn rt_subgame_ms_clamped(&self) -> u64 {
        self.rt_subgame_ms.clamp(200, 800)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.start_stack, 200);
        assert_eq!(cfg.small_blind, 1);
        assert_eq!(cfg.big_blind, 2);
        assert_eq!(cfg.max_raises, 3);
        assert_eq!(cfg.equity_trials_eval, 600);
        assert_eq!(cfg.rt_trigger_pot, 60);
    }

    #[test]
    fn clamps_respect_bounds() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.equity_trials_eval_clamped(50), 100);
        assert_eq!(cfg.equity_trials_eval_clamped(5000), 2000);
        assert_eq!(cfg.equity_trials_train_clamped(5000), 300);
    }
}
