//! Discounted CFR blueprint trainer (§4.7): external-sampling CFR over
//! postflop nodes reached by heuristically simulating both seats'
//! preflop action, with discounted regret accumulation, periodic
//! checkpointing, and plateau-based early stopping.

pub mod checkpoint;
pub mod discount;
pub mod node;
pub mod profiles;

use std::collections::HashMap;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::blueprint::{CheckpointRecord, StrategyFile, StrategyMeta};
use crate::config::EngineConfig;
use crate::equity;
use crate::game::{Action, HandContext, HandState, EPS, NUM_ACTIONS};
use crate::infoset;
use crate::preflop::{self, OpponentTendency};

use node::NodeTable;
use profiles::{choose_action, OpponentProfile, ALL_PROFILES};

pub const ACTION_ABSTRACTION_VERSION: &str = "headsup-v1";

#[derive(Debug, Clone, Copy)]
pub struct TrainerConfig {
    pub target_iterations: u64,
    pub seed: u64,
    pub checkpoint_every: u64,
    pub min_iters_before_stop: u64,
    pub eval_hands_per_profile: u32,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            target_iterations: 20_000,
            seed: 0,
            checkpoint_every: 500,
            min_iters_before_stop: 2_000,
            eval_hands_per_profile: 200,
        }
    }
}

fn sample_by_strategy<R: Rng + ?Sized>(
    strategy: &[f64; NUM_ACTIONS],
    legal: &[Action],
    rng: &mut R,
) -> Action {
    let total: f64 = legal.iter().map(|&a| strategy[a.index()]).sum();
    if total <= 1e-12 {
        let idx = rng.gen_range(0..legal.len());
        return legal[idx];
    }
    let mut draw = rng.gen_range(0.0..total);
    for &a in legal {
        let w = strategy[a.index()];
        if draw < w {
            return a;
        }
        draw -= w;
    }
    *legal.last().expect("legal is non-empty")
}

/// Simulate both seats preflop using the heuristic mix until a postflop
/// node or a terminal is reached.
fn simulate_preflop<R: Rng + ?Sized>(
    state: &mut HandState,
    ctx: &HandContext,
    config: &EngineConfig,
    trials: u32,
    rng: &mut R,
) {
    while state.street_idx == 0 && !state.terminal {
        let legal = state.legal_actions(config);
        let hole = &ctx.hole[state.to_act];
        let tier = preflop::classify(hole);
        let facing_raise = state.to_call() > EPS;
        let hs = equity::equity_vs_random(hole, &[], trials, rng.gen()).equity();
        let mix = preflop::action_mix(tier, facing_raise, hs, &OpponentTendency::default());
        let weights = preflop::distribute_over_actions(mix, hs, facing_raise, &legal);
        let action = preflop::sample_from_weights(&weights, rng);
        state.apply_action(action, ctx, config);
    }
}

/// Recursive external-sampling DCFR from a postflop state, updating
/// `table` for `traverser` and returning traverser utility in big blinds.
#[allow(clippy::too_many_arguments)]
fn cfr<R: Rng + ?Sized>(
    state: HandState,
    ctx: &HandContext,
    table: &mut NodeTable,
    traverser: usize,
    t: f64,
    config: &EngineConfig,
    trials: u32,
    rng: &mut R,
) -> f64 {
    if state.terminal {
        return state.payoff(traverser, config) / config.big_blind as f64;
    }

    let board = ctx.board_upto(state.street_idx);
    let hole = &ctx.hole[state.to_act];
    let hs = equity::equity_vs_random(hole, board, trials, rng.gen()).equity();
    let key = infoset::infoset_key(&state, board, hs);
    let id = table.id_for(&key);
    let legal = state.legal_actions(config);
    table.mark_legal(id, &legal);
    let strategy = table.current_strategy(id, &legal);
    table.accumulate_strategy(id, &strategy);

    if state.to_act == traverser {
        let mut utils = [0.0; NUM_ACTIONS];
        let mut node_util = 0.0;
        for &a in &legal {
            let mut next = state.clone();
            next.apply_action(a, ctx, config);
            let u = cfr(next, ctx, table, traverser, t, config, trials, rng);
            utils[a.index()] = u;
            node_util += strategy[a.index()] * u;
        }
        table.discount(id, t);
        for &a in &legal {
            table.add_regret(id, a, utils[a.index()] - node_util);
        }
        node_util
    } else {
        let action = sample_by_strategy(&strategy, &legal, rng);
        let mut next = state.clone();
        next.apply_action(action, ctx, config);
        cfr(next, ctx, table, traverser, t, config, trials, rng)
    }
}

/// The bot's action during evaluation: the learned average strategy
/// postflop (falling back to a uniform draw over legal actions if the
/// infoset was never visited), the heuristic mix preflop.
fn bot_eval_action<R: Rng + ?Sized>(
    state: &HandState,
    ctx: &HandContext,
    table: &NodeTable,
    config: &EngineConfig,
    trials: u32,
    rng: &mut R,
) -> Action {
    let legal = state.legal_actions(config);
    if state.street_idx == 0 {
        let hole = &ctx.hole[state.to_act];
        let tier = preflop::classify(hole);
        let facing_raise = state.to_call() > EPS;
        let hs = equity::equity_vs_random(hole, &[], trials, rng.gen()).equity();
        let mix = preflop::action_mix(tier, facing_raise, hs, &OpponentTendency::default());
        let weights = preflop::distribute_over_actions(mix, hs, facing_raise, &legal);
        return preflop::sample_from_weights(&weights, rng);
    }

    let board = ctx.board_upto(state.street_idx);
    let hole = &ctx.hole[state.to_act];
    let hs = equity::equity_vs_random(hole, board, trials, rng.gen()).equity();
    let key = infoset::infoset_key(state, board, hs);
    match table.id_of(&key) {
        Some(id) => {
            let avg = table.average_strategy(id);
            sample_by_strategy(&avg, &legal, rng)
        }
        None => {
            let idx = rng.gen_range(0..legal.len());
            legal[idx]
        }
    }
}

fn play_eval_hand<R: Rng + ?Sized>(
    table: &NodeTable,
    profile: OpponentProfile,
    bot_seat: usize,
    config: &EngineConfig,
    trials: u32,
    rng: &mut R,
) -> f64 {
    let ctx = HandContext::deal(rng);
    let mut state = HandState::new_preflop(config);
    let mut guard = 0;
    while !state.terminal && guard < 200 {
        guard += 1;
        let action = if state.to_act == bot_seat {
            bot_eval_action(&state, &ctx, table, config, trials, rng)
        } else {
            let legal = state.legal_actions(config);
            choose_action(profile, &legal, state.to_call(), state.pot, rng)
        };
        state.apply_action(action, &ctx, config);
    }
    state.payoff(bot_seat, config) / config.big_blind as f64
}

fn evaluate_profile<R: Rng + ?Sized>(
    table: &NodeTable,
    profile: OpponentProfile,
    hands: u32,
    config: &EngineConfig,
    trials: u32,
    rng: &mut R,
) -> f64 {
    let mut total = 0.0;
    for i in 0..hands {
        let bot_seat = (i % 2) as usize;
        total += play_eval_hand(table, profile, bot_seat, config, trials, rng);
    }
    total / hands.max(1) as f64
}

pub struct TrainOutcome {
    pub strategy_file: StrategyFile,
    pub stopping_reason: String,
}

/// Run the full DCFR training loop and return the exported strategy
/// file, with a progress bar over `target_iterations`.
pub fn train(config: &EngineConfig, trainer_config: &TrainerConfig) -> TrainOutcome {
    let mut table = NodeTable::new();
    let mut rng = StdRng::seed_from_u64(trainer_config.seed);
    let trials = config.equity_trials_train_clamped(config.equity_trials_train) as u32;

    let mut checkpoints: Vec<CheckpointRecord> = Vec::new();
    let mut prev_snapshot: HashMap<String, [f64; NUM_ACTIONS]> = HashMap::new();
    let mut stopping_reason = "target_iterations_reached".to_string();
    let start = Instant::now();

    let bar = ProgressBar::new(trainer_config.target_iterations);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} iters ({eta})") {
        bar.set_style(style);
    }

    for iter in 1..=trainer_config.target_iterations {
        let traverser = (iter % 2) as usize;
        let ctx = HandContext::deal(&mut rng);
        let mut state = HandState::new_preflop(config);
        simulate_preflop(&mut state, &ctx, config, trials, &mut rng);

        if !state.terminal && state.street_idx > 0 {
            cfr(
                state,
                &ctx,
                &mut table,
                traverser,
                iter as f64,
                config,
                trials,
                &mut rng,
            );
        }

        bar.inc(1);

        if iter % trainer_config.checkpoint_every == 0 {
            let snapshot = checkpoint::export_policy(&table);
            let drift = checkpoint::l1_drift(&prev_snapshot, &snapshot);

            let mut eval_by_profile = HashMap::new();
            for profile in ALL_PROFILES {
                let ev = evaluate_profile(
                    &table,
                    profile,
                    trainer_config.eval_hands_per_profile,
                    config,
                    trials,
                    &mut rng,
                );
                eval_by_profile.insert(profile.label().to_string(), ev);
            }

            let throughput = iter as f64 / start.elapsed().as_secs_f64().max(1e-6);
            let record = checkpoint::build_record(iter, &table, throughput, drift, eval_by_profile);
            info!(
                "checkpoint iter={} infosets={} drift={:.4} agg_ev={:.4}",
                iter, record.infoset_count, record.drift, record.eval_ev_aggregate
            );
            checkpoints.push(record);
            prev_snapshot = snapshot;

            if iter >= trainer_config.min_iters_before_stop && checkpoints.len() >= 3 {
                let tail = &checkpoints[checkpoints.len() - 3..];
                let drift_ok = tail.iter().all(|c| c.drift <= config.drift_plateau);
                let evs: Vec<f64> = tail.iter().map(|c| c.eval_ev_aggregate).collect();
                let ev_range = evs.iter().cloned().fold(f64::MIN, f64::max)
                    - evs.iter().cloned().fold(f64::MAX, f64::min);
                if drift_ok && ev_range <= config.ev_plateau {
                    stopping_reason = "plateau_reached".to_string();
                    bar.finish_with_message(stopping_reason.clone());
                    break;
                }
            }
        }
    }
    if !bar.is_finished() {
        bar.finish_with_message(stopping_reason.clone());
    }

    let policy = checkpoint::export_policy(&table);
    let meta = StrategyMeta {
        iterations: checkpoints.last().map(|c| c.iter).unwrap_or(0),
        seed: trainer_config.seed,
        small_blind: config.small_blind,
        big_blind: config.big_blind,
        start_stack: config.start_stack,
        max_raises: config.max_raises,
        equity_trials: trials as usize,
        action_abstraction_version: ACTION_ABSTRACTION_VERSION.to_string(),
        stopping_reason: stopping_reason.clone(),
        checkpoints,
    };

    let strategy_file = StrategyFile { meta, policy }.rounded();
    TrainOutcome {
        strategy_file,
        stopping_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_training_run_produces_a_policy() {
        let config = EngineConfig::default();
        let trainer_config = TrainerConfig {
            target_iterations: 40,
            seed: 7,
            checkpoint_every: 20,
            min_iters_before_stop: 10_000,
            eval_hands_per_profile: 4,
        };
        let outcome = train(&config, &trainer_config);
        assert!(!outcome.strategy_file.policy.is_empty() || outcome.strategy_file.meta.iterations == 0);
        assert_eq!(outcome.stopping_reason, "target_iterations_reached");
    }
}
