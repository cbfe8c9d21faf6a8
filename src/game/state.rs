//! The heads-up betting state machine: blinds, legal actions, street
//! advance, terminal resolution and pot settlement.

use rand::Rng;

use crate::cards::{Card, Deck};
use crate::config::EngineConfig;
use crate::hand_evaluator::compare_hands;

use super::action::Action;

/// Tolerance below which a chip amount is treated as zero.
pub const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Seat(usize),
    Tie,
}

/// The two hole-card pairs and the full five-card board, dealt once up
/// front and revealed to the state machine three/four/five cards at a time.
#[derive(Debug, Clone)]
pub struct HandContext {
    pub hole: [[Card; 2]; 2],
    pub board: [Card; 5],
}

impl HandContext {
    pub fn deal<R: Rng + ?Sized>(rng: &mut R) -> HandContext {
        let mut deck = Deck::new(None);
        deck.shuffle(rng);
        let dealt = deck
            .deal(9)
            .expect("fresh 52-card deck always has 9 cards to give");
        let hole = [[dealt[0], dealt[1]], [dealt[2], dealt[3]]];
        let board = [dealt[4], dealt[5], dealt[6], dealt[7], dealt[8]];
        HandContext { hole, board }
    }

    /// Board cards visible at `street_idx` (0/3/4/5 cards).
    pub fn board_upto(&self, street_idx: u8) -> &[Card] {
        let n = match street_idx {
            0 => 0,
            1 => 3,
            2 => 4,
            _ => 5,
        };
        &self.board[..n]
    }
}

#[derive(Debug, Clone)]
pub struct HandState {
    pub street_idx: u8,
    pub pot: f64,
    pub current_bet: f64,
    pub commit: [f64; 2],
    pub stack: [f64; 2],
    pub raises: u8,
    pub acted: [bool; 2],
    pub to_act: usize,
    pub history: Vec<Action>,
    pub terminal: bool,
    pub winner: Option<Winner>,
    settled: bool,
}

impl HandState {
    /// A fresh preflop state with blinds posted; seat 0 is the small
    /// blind and acts first.
    pub fn new_preflop(config: &EngineConfig) -> HandState {
        let sb = config.small_blind as f64;
        let bb = config.big_blind as f64;
        let start = config.start_stack as f64;
        HandState {
            street_idx: 0,
            pot: sb + bb,
            current_bet: bb,
            commit: [sb, bb],
            stack: [start - sb, start - bb],
            raises: 0,
            acted: [false, false],
            to_act: 0,
            history: Vec::new(),
            terminal: false,
            winner: None,
            settled: false,
        }
    }

    pub fn to_call(&self) -> f64 {
        (self.current_bet - self.commit[self.to_act]).max(0.0)
    }

    pub fn acting_stack(&self) -> f64 {
        self.stack[self.to_act]
    }

    pub fn spr(&self) -> f64 {
        self.acting_stack() / self.pot.max(1.0)
    }

    /// Legal actions for the seat to act, per the action abstraction.
    pub fn legal_actions(&self, config: &EngineConfig) -> Vec<Action> {
        if self.terminal {
            return Vec::new();
        }
        let to_call = self.to_call();
        let stack = self.acting_stack();
        let preflop = self.street_idx == 0;
        let mut out = Vec::new();

        if to_call <= EPS {
            out.push(Action::Check);
            if stack > 0.0 {
                if preflop {
                    if self.raises < config.max_raises {
                        out.push(Action::RaiseHalf);
                        out.push(Action::RaisePot);
                    }
                    out.push(Action::AllIn);
                } else {
                    out.push(Action::BetHalf);
                    out.push(Action::BetPot);
                    out.push(Action::AllIn);
                }
            }
        } else {
            out.push(Action::Fold);
            out.push(Action::Call);
            if stack > to_call {
                if self.raises < config.max_raises {
                    out.push(Action::RaiseHalf);
                    out.push(Action::RaisePot);
                }
                out.push(Action::AllIn);
            }
        }
        out
    }

    /// The target total commitment (this street) the acting seat would
    /// have after taking `action`.
    fn target_commit(&self, config: &EngineConfig, action: Action) -> f64 {
        let seat = self.to_act;
        let commit = self.commit[seat];
        let stack = self.stack[seat];
        let to_call = self.to_call();
        let pot = self.pot;
        let bb = config.big_blind as f64;
        let preflop = self.street_idx == 0;

        match action {
            Action::Fold | Action::Check => commit,
            Action::Call => commit + stack.min(to_call),
            Action::BetHalf => commit + stack.min((pot * 0.5).max(1.0)),
            Action::BetPot => commit + stack.min(pot.max(1.0)),
            Action::RaiseHalf => {
                if preflop {
                    self.current_bet + stack.min((to_call * 2.0).max(bb * 2.0))
                } else {
                    self.current_bet + stack.min(to_call.max((pot * 0.5).max(1.0)))
                }
            }
            Action::RaisePot => {
                if preflop {
                    self.current_bet + stack.min((to_call * 3.0).max(bb * 3.0))
                } else {
                    self.current_bet + stack.min(to_call.max(pot.max(1.0)))
                }
            }
            Action::AllIn => commit + stack,
        }
    }

    /// The chip amount the acting seat would pay this street if it took
    /// `action`, capped by its remaining stack. Used by the EV scorer to
    /// size bets/raises without duplicating the target-commit math.
    pub fn pay_for_action(&self, config: &EngineConfig, action: Action) -> f64 {
        let target = self.target_commit(config, action);
        (target - self.commit[self.to_act])
            .min(self.stack[self.to_act])
            .max(0.0)
    }

    /// Apply `action`, unconditionally trusting the caller already
    /// checked legality (the session layer owns `InvalidAction`
    /// rejection). Mutates in place and advances the street or settles
    /// the hand when appropriate.
    pub fn apply_action(&mut self, action: Action, ctx: &HandContext, config: &EngineConfig) {
        if self.terminal {
            return;
        }
        let seat = self.to_act;

        if action == Action::Fold {
            self.history.push(action);
            self.terminal = true;
            self.winner = Some(Winner::Seat(1 - seat));
            self.settle();
            return;
        }

        if action == Action::Check || (action == Action::Call && self.to_call() <= EPS) {
            self.history.push(action);
            self.acted[seat] = true;
            self.to_act = 1 - seat;
            self.advance_if_ready(ctx, config);
            return;
        }

        let target = self.target_commit(config, action);
        let pay = (target - self.commit[seat]).min(self.stack[seat]).max(0.0);
        self.stack[seat] -= pay;
        self.commit[seat] += pay;
        self.pot += pay;

        if self.commit[seat] > self.current_bet + EPS {
            self.current_bet = self.commit[seat];
            self.raises += 1;
            self.acted = [false, false];
            self.acted[seat] = true;
        } else {
            self.acted[seat] = true;
        }

        self.history.push(action);
        self.to_act = 1 - seat;
        self.advance_if_ready(ctx, config);
    }

    fn both_matched(&self) -> bool {
        self.acted[0] && self.acted[1] && (self.commit[0] - self.commit[1]).abs() <= EPS
    }

    fn advance_if_ready(&mut self, ctx: &HandContext, config: &EngineConfig) {
        if !self.both_matched() {
            return;
        }
        self.advance_street(ctx, config);
    }

    fn reset_street_betting(&mut self) {
        self.current_bet = 0.0;
        self.commit = [0.0, 0.0];
        self.raises = 0;
        self.acted = [false, false];
        self.to_act = 0;
    }

    fn advance_street(&mut self, ctx: &HandContext, config: &EngineConfig) {
        let _ = config;
        if self.street_idx == 3 {
            self.resolve_showdown(ctx);
            return;
        }
        self.street_idx += 1;
        self.reset_street_betting();

        let closed_all_in = self.stack[0] <= EPS || self.stack[1] <= EPS;
        if closed_all_in {
            while self.street_idx < 3 {
                self.street_idx += 1;
            }
            self.resolve_showdown(ctx);
        }
    }

    fn resolve_showdown(&mut self, ctx: &HandContext) {
        let board = ctx.board_upto(3);
        let cmp = compare_hands(&ctx.hole[0], &ctx.hole[1], board).unwrap_or(0);
        self.terminal = true;
        self.winner = Some(match cmp {
            1 => Winner::Seat(0),
            -1 => Winner::Seat(1),
            _ => Winner::Tie,
        });
        self.settle();
    }

    /// Move the pot into the winner's stack. Idempotent: calling this
    /// more than once on a settled hand is a no-op.
    pub fn settle(&mut self) {
        if self.settled {
            return;
        }
        match self.winner {
            Some(Winner::Seat(seat)) => self.stack[seat] += self.pot,
            Some(Winner::Tie) => {
                let half = self.pot / 2.0;
                self.stack[0] += half;
                self.stack[1] += half;
            }
            None => return,
        }
        self.pot = 0.0;
        self.settled = true;
    }

    /// Net payoff for `seat` relative to the starting stack.
    pub fn payoff(&self, seat: usize, config: &EngineConfig) -> f64 {
        self.stack[seat] - config.start_stack as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn chip_conservation_holds_after_fold() {
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let ctx = HandContext::deal(&mut rng);
        let mut state = HandState::new_preflop(&config);
        state.apply_action(Action::AllIn, &ctx, &config);
        state.apply_action(Action::Fold, &ctx, &config);
        assert!(state.terminal);
        let total = state.pot + state.stack[0] + state.stack[1];
        assert!((total - 2.0 * config.start_stack as f64).abs() < 1e-6);
    }

    #[test]
    fn check_through_to_showdown_settles() {
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let ctx = HandContext::deal(&mut rng);
        let mut state = HandState::new_preflop(&config);
        // preflop: SB calls, BB checks
        state.apply_action(Action::Call, &ctx, &config);
        state.apply_action(Action::Check, &ctx, &config);
        assert_eq!(state.street_idx, 1);
        for _ in 0..3 {
            if state.terminal {
                break;
            }
            state.apply_action(Action::Check, &ctx, &config);
            state.apply_action(Action::Check, &ctx, &config);
        }
        assert!(state.terminal);
        let total = state.pot + state.stack[0] + state.stack[1];
        assert!((total - 2.0 * config.start_stack as f64).abs() < 1e-6);
    }

    #[test]
    fn raise_cap_removes_further_raises() {
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let ctx = HandContext::deal(&mut rng);
        let mut state = HandState::new_preflop(&config);
        for _ in 0..config.max_raises {
            let legal = state.legal_actions(&config);
            if !legal.contains(&Action::RaisePot) {
                break;
            }
            state.apply_action(Action::RaisePot, &ctx, &config);
        }
        let legal = state.legal_actions(&config);
        assert!(!legal.contains(&Action::RaiseHalf));
        assert!(!legal.contains(&Action::RaisePot));
    }

    #[test]
    fn history_grows_by_one_per_action() {
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let ctx = HandContext::deal(&mut rng);
        let mut state = HandState::new_preflop(&config);
        let before = state.history.len();
        state.apply_action(Action::Call, &ctx, &config);
        assert_eq!(state.history.len(), before + 1);
    }

    #[test]
    fn settle_is_idempotent() {
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let ctx = HandContext::deal(&mut rng);
        let mut state = HandState::new_preflop(&config);
        state.apply_action(Action::AllIn, &ctx, &config);
        state.apply_action(Action::Fold, &ctx, &config);
        let stack_after_first = state.stack;
        state.settle();
        assert_eq!(stack_after_first, state.stack);
    }
}
