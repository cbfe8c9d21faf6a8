//! Realtime subgame solver (§4.8): a short, wall-clock-bounded DCFR pass
//! over the current decision node only, using a cheap noised EV leaf
//! evaluator instead of terminal enumeration, seeded by the blueprint
//! prior.

use std::collections::HashMap;
use std::time::Instant;

use rand::Rng;

use crate::cards::Card;
use crate::config::EngineConfig;
use crate::ev::{self, EvContext, ReactionStats};
use crate::game::{Action, HandState};
use crate::trainer::discount;

#[derive(Debug, Clone)]
pub struct SubgameResult {
    pub strategy: Vec<(Action, f64)>,
    pub chosen: Action,
    pub iterations: u64,
    pub elapsed_ms: u64,
}

/// Whether the realtime solve should run at all: turn or river, pot or
/// SPR past the trigger, and betting not already closed all-in.
pub fn should_trigger(state: &HandState, config: &EngineConfig) -> bool {
    let street_ok = state.street_idx >= 2;
    let pot_ok = state.pot >= config.rt_trigger_pot as f64;
    let spr_ok = state.spr() <= config.rt_trigger_spr;
    let closed_all_in = state.stack[0] <= crate::game::EPS || state.stack[1] <= crate::game::EPS;
    street_ok && (pot_ok || spr_ok) && !closed_all_in
}

fn project_prior(legal: &[Action], prior: &dyn Fn(Action) -> f64) -> HashMap<Action, f64> {
    let mut weights: HashMap<Action, f64> = legal.iter().map(|&a| (a, prior(a).max(0.0))).collect();
    let total: f64 = weights.values().sum();
    if total > 1e-9 {
        for v in weights.values_mut() {
            *v /= total;
        }
    } else {
        let uniform = 1.0 / legal.len().max(1) as f64;
        for v in weights.values_mut() {
            *v = uniform;
        }
    }
    weights
}

/// Run the budgeted realtime solve and return the averaged strategy plus
/// its argmax.
#[allow(clippy::too_many_arguments)]
pub fn solve<R: Rng + ?Sized>(
    state: &HandState,
    legal: &[Action],
    board: &[Card],
    hs: f64,
    prior: &dyn Fn(Action) -> f64,
    reaction: ReactionStats,
    belief_tilt: f64,
    config: &EngineConfig,
    rng: &mut R,
) -> SubgameResult {
    let budget_ms = config.rt_subgame_ms_clamped();
    let depth = config.rt_subgame_depth.max(1) as f64;
    let prior_weights = project_prior(legal, prior);

    let mut regrets: HashMap<Action, f64> = legal.iter().map(|&a| (a, 0.0)).collect();
    let mut strategy_sum: HashMap<Action, f64> = legal.iter().map(|&a| (a, 0.0)).collect();

    let start = Instant::now();
    let mut t: u64 = 0;

    while (start.elapsed().as_millis() as u64) < budget_ms {
        t += 1;

        let positive_sum: f64 = legal.iter().map(|&a| regrets[&a].max(0.0)).sum();
        let strategy: HashMap<Action, f64> = legal
            .iter()
            .map(|&a| {
                let rm = if positive_sum > 1e-12 {
                    regrets[&a].max(0.0) / positive_sum
                } else {
                    1.0 / legal.len().max(1) as f64
                };
                let blended = config.rt_prior_weight * prior_weights[&a]
                    + (1.0 - config.rt_prior_weight) * rm;
                (a, blended)
            })
            .collect();

        let strong_tilt = belief_tilt.max(0.0);
        let utils: HashMap<Action, f64> = legal
            .iter()
            .map(|&a| {
                let base_ev = ev::score_action(
                    a,
                    state,
                    config,
                    &EvContext {
                        board,
                        hs,
                        reaction,
                        belief_tilt,
                    },
                );
                let pay = state.pay_for_action(config, a);
                let noise = rng.gen_range(-1.0..1.0) * state.pot * 0.004;
                let continuation =
                    (hs - 0.5 - 0.25 * strong_tilt) * state.pot * 0.24 * (depth - 1.0) / depth;
                let tension = 0.06 * (pay / state.pot.max(1.0)) * pay;
                (a, base_ev + noise + continuation - tension)
            })
            .collect();

        let node_util: f64 = legal.iter().map(|&a| strategy[&a] * utils[&a]).sum();

        let pos_mult = discount::positive_multiplier(t as f64);
        let neg_mult = discount::negative_multiplier(t as f64);
        for &a in legal {
            let r = regrets.get_mut(&a).expect("regret row exists for every legal action");
            *r = if *r > 0.0 { *r * pos_mult } else { *r * neg_mult };
            *r += utils[&a] - node_util;
        }
        for &a in legal {
            *strategy_sum.get_mut(&a).expect("strategy_sum row exists for every legal action") +=
                strategy[&a];
        }
    }

    let total_sum: f64 = strategy_sum.values().sum();
    let strategy: Vec<(Action, f64)> = if total_sum > 1e-12 {
        legal.iter().map(|&a| (a, strategy_sum[&a] / total_sum)).collect()
    } else {
        let uniform = 1.0 / legal.len().max(1) as f64;
        legal.iter().map(|&a| (a, uniform)).collect()
    };

    let chosen = strategy
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|&(a, _)| a)
        .unwrap_or(Action::Fold);

    SubgameResult {
        strategy,
        chosen,
        iterations: t,
        elapsed_ms: start.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_board;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn strategy_sums_to_one_and_covers_only_legal() {
        let config = EngineConfig::default();
        let mut state = HandState::new_preflop(&config);
        state.street_idx = 2;
        state.pot = 80.0;
        let legal = vec![Action::Check, Action::BetHalf, Action::BetPot, Action::AllIn];
        let board = parse_board("9h8h7h2c").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let result = solve(
            &state,
            &legal,
            &board,
            0.55,
            &|_| 0.25,
            ReactionStats::default(),
            0.0,
            &config,
            &mut rng,
        );
        let total: f64 = result.strategy.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(result.strategy.iter().all(|(a, _)| legal.contains(a)));
        assert!(legal.contains(&result.chosen));
    }

    #[test]
    fn trigger_requires_turn_or_river_and_pot_or_spr() {
        let config = EngineConfig::default();
        let mut state = HandState::new_preflop(&config);
        assert!(!should_trigger(&state, &config));
        state.street_idx = 2;
        state.pot = 100.0;
        assert!(should_trigger(&state, &config));
    }
}
