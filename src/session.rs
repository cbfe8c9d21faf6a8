//! The session/decision orchestrator: per-hand lifecycle, the runtime
//! decision pipeline (legality filter → equity → infoset → blueprint
//! blend → optional realtime subgame → conservative override → belief
//! update), and the diagnostic counters the engine exposes.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::belief::{BettingContext, ObservedReaction, OpponentRangeBelief};
use crate::blueprint::{self, BlueprintPolicy};
use crate::cards::Card;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::equity;
use crate::ev::{self, EvContext, ReactionStats};
use crate::game::{Action, HandContext, HandState, Winner, EPS};
use crate::infoset;
use crate::preflop;
use crate::subgame;

#[derive(Debug, Clone, Copy, Default)]
pub struct Score {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub net: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostflopStreetStats {
    pub facing_bet: u32,
    pub fold_vs_bet: u32,
    pub call_vs_bet: u32,
    pub raise_vs_bet: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub facing_raise_pf: u32,
    pub threebet_pf: u32,
    pub call_vs_raise_pf: u32,
    /// Indexed by street − 1 (flop, turn, river).
    pub postflop: [PostflopStreetStats; 3],
}

impl SessionStats {
    fn record(&mut self, street_idx: u8, facing_bet: bool, action: Action) {
        if street_idx == 0 {
            if facing_bet {
                self.facing_raise_pf += 1;
                if action.is_bet_or_raise() {
                    self.threebet_pf += 1;
                } else if action == Action::Call {
                    self.call_vs_raise_pf += 1;
                }
            }
            return;
        }
        let idx = (street_idx - 1) as usize;
        if idx >= self.postflop.len() {
            return;
        }
        if facing_bet {
            let s = &mut self.postflop[idx];
            s.facing_bet += 1;
            match action {
                Action::Fold => s.fold_vs_bet += 1,
                Action::Call => s.call_vs_bet += 1,
                a if a.is_bet_or_raise() => s.raise_vs_bet += 1,
                _ => {}
            }
        }
    }

    fn reaction_stats(&self, street_idx: u8) -> ReactionStats {
        if street_idx == 0 {
            let samples = self.facing_raise_pf;
            if samples == 0 {
                return ReactionStats::default();
            }
            let call_rate = self.call_vs_raise_pf as f64 / samples as f64;
            let raise_rate = self.threebet_pf as f64 / samples as f64;
            let fold_rate = (1.0 - call_rate - raise_rate).max(0.0);
            return ReactionStats {
                fold_rate,
                call_rate,
                raise_rate,
                samples,
            };
        }
        let idx = (street_idx - 1) as usize;
        let s = self.postflop.get(idx).copied().unwrap_or_default();
        if s.facing_bet == 0 {
            return ReactionStats::default();
        }
        ReactionStats {
            fold_rate: s.fold_vs_bet as f64 / s.facing_bet as f64,
            call_rate: s.call_vs_bet as f64 / s.facing_bet as f64,
            raise_rate: s.raise_vs_bet as f64 / s.facing_bet as f64,
            samples: s.facing_bet,
        }
    }

    fn preflop_tendency(&self) -> preflop::OpponentTendency {
        if self.facing_raise_pf == 0 {
            return preflop::OpponentTendency::default();
        }
        preflop::OpponentTendency {
            threebet_rate: self.threebet_pf as f64 / self.facing_raise_pf as f64,
            call_vs_raise_rate: self.call_vs_raise_pf as f64 / self.facing_raise_pf as f64,
            samples: self.facing_raise_pf,
        }
    }
}

struct HandInstance {
    ctx: HandContext,
    state: HandState,
}

pub struct Session {
    pub hand_index: u64,
    pub human_seat: usize,
    pub score: Score,
    pub stats: SessionStats,
    pub range_belief: [OpponentRangeBelief; 2],
    current_hand: Option<HandInstance>,
}

#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub street_idx: u8,
    pub pot: f64,
    pub current_bet: f64,
    pub commit: [f64; 2],
    pub stack: [f64; 2],
    pub raises: u8,
    pub to_act: usize,
    pub board: Vec<Card>,
    pub legal_actions: Vec<Action>,
    pub terminal: bool,
}

#[derive(Debug, Clone)]
pub struct TerminalResult {
    pub winner: Option<Winner>,
    pub human_payoff: f64,
}

#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub snapshot: StateSnapshot,
    pub bot_actions: Vec<Action>,
    pub terminal: Option<TerminalResult>,
}

#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub small_blind: i32,
    pub big_blind: i32,
    pub start_stack: i32,
    pub max_raises: u8,
    pub equity_trials_eval: usize,
    pub abstraction_version: &'static str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    pub board_invariant_warnings: u64,
    pub evaluator_suspect_warnings: u64,
    pub illegal_state_warnings: u64,
    pub prior_hits: u64,
    pub prior_misses: u64,
    pub realtime_hits: u64,
    pub realtime_fallbacks: u64,
}

/// Owns the session table, the optional blueprint prior, and the
/// diagnostic counters — the single mutable handle the outside world
/// talks to.
pub struct Engine {
    config: EngineConfig,
    blueprint: Option<BlueprintPolicy>,
    diagnostics: Diagnostics,
    sessions: HashMap<u64, Session>,
    next_session_id: u64,
    rng: StdRng,
}

const POSTFLOP_TEMPERATURE: f64 = 0.30;
const PREFLOP_TEMPERATURE: f64 = 0.40;
const SELECT_TOLERANCE: f64 = 0.05;

impl Engine {
    pub fn new(config: EngineConfig) -> Engine {
        Engine {
            config,
            blueprint: None,
            diagnostics: Diagnostics::default(),
            sessions: HashMap::new(),
            next_session_id: 1,
            rng: StdRng::seed_from_u64(0),
        }
    }

    pub fn with_blueprint(config: EngineConfig, blueprint: BlueprintPolicy) -> Engine {
        let mut engine = Engine::new(config);
        engine.blueprint = Some(blueprint);
        engine
    }

    pub fn health(&self) -> Health {
        Health {
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
            start_stack: self.config.start_stack,
            max_raises: self.config.max_raises,
            equity_trials_eval: self.config.equity_trials_eval,
            abstraction_version: crate::trainer::ACTION_ABSTRACTION_VERSION,
        }
    }

    pub fn diag(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn score(&self, session_id: u64) -> Option<Score> {
        self.sessions.get(&session_id).map(|s| s.score)
    }

    fn deal_hand(&mut self, session: &mut Session) -> ApplyResult {
        session.hand_index += 1;
        session.range_belief = [OpponentRangeBelief::default(), OpponentRangeBelief::default()];
        let ctx = HandContext::deal(&mut self.rng);
        let state = HandState::new_preflop(&self.config);
        session.current_hand = Some(HandInstance { ctx, state });
        self.run_bot_until_human_or_terminal(session)
    }

    /// Create a brand-new session for `human_seat` and deal its first
    /// hand, playing the bot through its turns until the human has a
    /// decision or the hand ends.
    pub fn new_hand(&mut self, human_seat: usize) -> (u64, ApplyResult) {
        let id = self.next_session_id;
        self.next_session_id += 1;
        let mut session = Session {
            hand_index: 0,
            human_seat,
            score: Score::default(),
            stats: SessionStats::default(),
            range_belief: [OpponentRangeBelief::default(), OpponentRangeBelief::default()],
            current_hand: None,
        };
        let result = self.deal_hand(&mut session);
        self.sessions.insert(id, session);
        (id, result)
    }

    /// Deal a fresh hand within an existing session, carrying its score
    /// and stats forward (belief resets per hand, per the lifecycle).
    pub fn next_hand(&mut self, session_id: u64) -> EngineResult<ApplyResult> {
        let mut session = self
            .sessions
            .remove(&session_id)
            .ok_or(EngineError::BadSession(session_id))?;
        let result = self.deal_hand(&mut session);
        self.sessions.insert(session_id, session);
        Ok(result)
    }

    pub fn apply_human_action(
        &mut self,
        session_id: u64,
        action_index: usize,
    ) -> EngineResult<ApplyResult> {
        let mut session = self
            .sessions
            .remove(&session_id)
            .ok_or(EngineError::BadSession(session_id))?;

        let result = (|| {
            let hand = session
                .current_hand
                .as_ref()
                .ok_or(EngineError::BadSession(session_id))?;
            let legal = hand.state.legal_actions(&self.config);
            let action = Action::from_index(action_index).filter(|a| legal.contains(a)).ok_or(
                EngineError::InvalidAction {
                    index: action_index,
                    legal_count: legal.len(),
                },
            )?;

            self.apply_and_record(&mut session, action);
            Ok(self.run_bot_until_human_or_terminal(&mut session))
        })();

        self.sessions.insert(session_id, session);
        result
    }

    fn apply_and_record(&mut self, session: &mut Session, action: Action) {
        let hand = session.current_hand.as_mut().expect("hand in progress");
        let seat = hand.state.to_act;
        let facing_bet = hand.state.to_call() > EPS;
        let street_idx = hand.state.street_idx;

        hand.state.apply_action(action, &hand.ctx, &self.config);

        session.stats.record(street_idx, facing_bet, action);
        let context = if facing_bet {
            BettingContext::FacingBet
        } else {
            BettingContext::Unopened
        };
        let reaction = classify_reaction(action);
        session.range_belief[seat].update(context, reaction);

        if session.current_hand.as_ref().map(|h| h.state.terminal) == Some(true) {
            self.settle_hand(session);
        }
    }

    fn settle_hand(&mut self, session: &mut Session) {
        let human_seat = session.human_seat;
        if let Some(hand) = &session.current_hand {
            let payoff = hand.state.payoff(human_seat, &self.config);
            if payoff > EPS {
                session.score.wins += 1;
            } else if payoff < -EPS {
                session.score.losses += 1;
            } else {
                session.score.ties += 1;
            }
            session.score.net += payoff;
        }
    }

    fn run_bot_until_human_or_terminal(&mut self, session: &mut Session) -> ApplyResult {
        let mut bot_actions = Vec::new();
        loop {
            let (terminal, to_act, human_seat) = {
                let hand = session.current_hand.as_ref().expect("hand in progress");
                (hand.state.terminal, hand.state.to_act, session.human_seat)
            };
            if terminal || to_act == human_seat {
                break;
            }
            let action = self.decide_bot_action(session);
            bot_actions.push(action);
            self.apply_and_record(session, action);
        }

        let hand = session.current_hand.as_ref().expect("hand in progress");
        let snapshot = snapshot_of(hand, &self.config);
        let terminal = if hand.state.terminal {
            Some(TerminalResult {
                winner: hand.state.winner,
                human_payoff: hand.state.payoff(session.human_seat, &self.config),
            })
        } else {
            None
        };
        ApplyResult {
            snapshot,
            bot_actions,
            terminal,
        }
    }

    fn decide_bot_action(&mut self, session: &mut Session) -> Action {
        let hand = session.current_hand.as_ref().expect("hand in progress");
        let state = &hand.state;
        let seat = state.to_act;
        let opponent = 1 - seat;
        let board = hand.ctx.board_upto(state.street_idx).to_vec();
        let hole = hand.ctx.hole[seat];

        let expected_board_len = match state.street_idx {
            0 => 0,
            1 => 3,
            2 => 4,
            _ => 5,
        };
        if board.len() != expected_board_len {
            self.diagnostics.board_invariant_warnings += 1;
        }

        let trials = self.config.equity_trials_eval_clamped(self.config.equity_trials_eval) as u32;
        let hs_raw = equity::equity_vs_random(&hole, &board, trials, self.rng.next_u64()).equity();
        let extreme = hs_raw <= 1e-4 || hs_raw >= 0.9999;
        let few_samples = trials < 200;
        if extreme && few_samples && state.street_idx < 3 {
            self.diagnostics.evaluator_suspect_warnings += 1;
        }
        let hs = crate::belief::conditioned_equity(hs_raw, &session.range_belief[opponent]);

        let legal_raw = state.legal_actions(&self.config);
        if legal_raw.is_empty() {
            self.diagnostics.illegal_state_warnings += 1;
        }
        let legal = ev::legality_prefilter(&legal_raw, state, hs);

        let reaction = session.stats.reaction_stats(state.street_idx);
        let belief_tilt = session.range_belief[opponent].tilt();
        let ev_ctx = EvContext {
            board: &board,
            hs,
            reaction,
            belief_tilt,
        };
        let scored: Vec<(Action, f64)> = legal
            .iter()
            .map(|&a| (a, ev::score_action(a, state, &self.config, &ev_ctx)))
            .collect();

        let key = infoset::infoset_key(state, &board, hs);
        let mut chosen = match &self.blueprint {
            Some(bp) if bp.lookup(&key).is_some() => {
                self.diagnostics.prior_hits += 1;
                let prior = |a: Action| bp.prior_for(&key, a);
                let temp = if state.street_idx == 0 {
                    PREFLOP_TEMPERATURE
                } else {
                    POSTFLOP_TEMPERATURE
                };
                let blended = blueprint::blend_scores(&scored, &prior, self.config.ev_blend, self.config.prob_floor);
                let probs = blueprint::softmax(&blended, temp);
                blueprint::best_blended_action(&probs).unwrap_or(Action::Fold)
            }
            _ => {
                self.diagnostics.prior_misses += 1;
                if state.street_idx == 0 {
                    let facing_raise = state.to_call() > EPS;
                    let tier = preflop::classify(&hole);
                    let tendency = session.stats.preflop_tendency();
                    let mix = preflop::action_mix(tier, facing_raise, hs, &tendency);
                    let weights = preflop::distribute_over_actions(mix, hs, facing_raise, &legal);
                    let ev_lookup = |a: Action| {
                        scored.iter().find(|&&(sa, _)| sa == a).map(|&(_, v)| v).unwrap_or(0.0)
                    };
                    preflop::sample_preflop_action(&weights, &ev_lookup, &mut self.rng)
                } else {
                    ev::select_action(&scored, SELECT_TOLERANCE)
                }
            }
        };

        if subgame::should_trigger(state, &self.config) {
            self.diagnostics.realtime_hits += 1;
            let prior = |a: Action| {
                self.blueprint
                    .as_ref()
                    .map(|bp| bp.prior_for(&key, a))
                    .unwrap_or(0.0)
            };
            let result = subgame::solve(
                state,
                &legal,
                &board,
                hs,
                &prior,
                reaction,
                belief_tilt,
                &self.config,
                &mut self.rng,
            );
            chosen = result.chosen;
        } else {
            self.diagnostics.realtime_fallbacks += 1;
        }

        ev::conservative_override(chosen, &legal, state, hs, &board)
    }
}

fn classify_reaction(action: Action) -> ObservedReaction {
    match action {
        Action::Fold => ObservedReaction::Fold,
        Action::Check | Action::Call => ObservedReaction::Passive,
        _ => ObservedReaction::Aggressive,
    }
}

fn snapshot_of(hand: &HandInstance, config: &EngineConfig) -> StateSnapshot {
    let board = hand.ctx.board_upto(hand.state.street_idx).to_vec();
    StateSnapshot {
        street_idx: hand.state.street_idx,
        pot: hand.state.pot,
        current_bet: hand.state.current_bet,
        commit: hand.state.commit,
        stack: hand.state.stack,
        raises: hand.state.raises,
        to_act: hand.state.to_act,
        board,
        legal_actions: hand.state.legal_actions(config),
        terminal: hand.state.terminal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_hand_returns_snapshot_with_legal_actions() {
        let config = EngineConfig::default();
        let mut engine = Engine::new(config);
        let (session_id, result) = engine.new_hand(0);
        assert!(session_id >= 1);
        assert!(result.terminal.is_some() || !result.snapshot.legal_actions.is_empty());
    }

    #[test]
    fn bad_session_id_is_rejected() {
        let config = EngineConfig::default();
        let mut engine = Engine::new(config);
        let err = engine.apply_human_action(9999, 0);
        assert!(matches!(err, Err(EngineError::BadSession(9999))));
    }

    #[test]
    fn invalid_action_index_is_rejected() {
        let config = EngineConfig::default();
        let mut engine = Engine::new(config);
        let (session_id, result) = engine.new_hand(0);
        if result.terminal.is_none() {
            let err = engine.apply_human_action(session_id, 99);
            assert!(matches!(err, Err(EngineError::InvalidAction { .. })));
        }
    }
}
