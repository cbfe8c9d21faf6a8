//! Closed-form EV scoring per legal action, a legality pre-filter, and
//! the conservative override that clamps over-aggressive lines.

use log::warn;

use crate::cards::Card;
use crate::config::EngineConfig;
use crate::game::{Action, HandState};
use crate::infoset::texture_bits;

/// Observed opponent reaction rates to a bet/raise, used to tilt the
/// heuristic fold/call/raise model once enough samples exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactionStats {
    pub fold_rate: f64,
    pub call_rate: f64,
    pub raise_rate: f64,
    pub samples: u32,
}

/// Everything the scorer needs beyond the bare game state.
pub struct EvContext<'a> {
    pub board: &'a [Card],
    pub hs: f64,
    pub reaction: ReactionStats,
    /// `strong − weak` from the opponent range belief; used to tilt the
    /// bet/raise response model.
    pub belief_tilt: f64,
}

fn board_wetness(board: &[Card]) -> (bool, bool) {
    let bits = texture_bits(board);
    let paired = bits & 0b1000 != 0;
    let two_tone = bits & 0b0100 != 0;
    let monotone = bits & 0b0010 != 0;
    let connected = bits & 0b0001 != 0;
    let wet = !paired && (two_tone || monotone || connected);
    (paired, wet)
}

fn realize_equity(paired: bool, wet: bool) -> f64 {
    if paired {
        0.95
    } else if wet {
        0.90
    } else {
        0.93
    }
}

/// Required equity to profitably pay `pay` into a pot of `pot` (break-even
/// pot odds), shared with the bet/raise response model.
pub fn required_equity(pot: f64, pay: f64) -> f64 {
    if pot + pay + pay <= 0.0 {
        return 0.0;
    }
    pay / (pot + pay + pay)
}

fn bet_response_probs(
    pay: f64,
    pot: f64,
    reaction: ReactionStats,
    belief_tilt: f64,
) -> (f64, f64, f64) {
    let sizing = pay / pot.max(1.0);
    let mut p_fold = (0.22 + sizing * 0.18).clamp(0.05, 0.75);
    let mut p_raise = (0.12 - sizing * 0.05).clamp(0.02, 0.30);
    let mut p_call = (1.0 - p_fold - p_raise).max(0.0);

    if reaction.samples >= 8 {
        p_fold = p_fold * 0.6 + reaction.fold_rate * 0.4;
        p_call = p_call * 0.6 + reaction.call_rate * 0.4;
        p_raise = p_raise * 0.6 + reaction.raise_rate * 0.4;
    }

    p_call = (p_call + belief_tilt * 0.18).clamp(0.0, 1.0);
    p_raise = (p_raise + belief_tilt * 0.10).clamp(0.0, 1.0);
    p_fold = (1.0 - p_call - p_raise).max(0.0);

    let total = (p_fold + p_call + p_raise).max(1e-9);
    (p_fold / total, p_call / total, p_raise / total)
}

/// Deterministic EV penalties layered on top of the opponent-response
/// model; see §4.5.
fn apply_penalties(ev: f64, action: Action, state: &HandState, hs: f64, paired: bool, wet: bool, pot: f64) -> f64 {
    let mut ev = ev;
    let spr = state.spr();

    if action.is_bet_or_raise() && (0.40..=0.65).contains(&hs) && spr > 2.0 {
        ev -= 0.15 * pot;
    }
    if paired && (0.40..=0.65).contains(&hs) && action.is_bet_or_raise() {
        ev -= 0.10 * pot;
    }
    if !paired && !wet && matches!(action, Action::BetPot | Action::RaisePot) {
        ev -= 0.08 * pot;
    }
    if action == Action::AllIn && spr > 6.0 {
        ev -= 0.30 * pot;
    }
    ev
}

/// EV of a single legal action, relative to the current pot.
pub fn score_action(action: Action, state: &HandState, config: &EngineConfig, ctx: &EvContext) -> f64 {
    let pot = state.pot;
    let hs = ctx.hs;

    match action {
        Action::Fold => 0.0,
        Action::Check => hs * pot,
        Action::Call => {
            let (paired, wet) = board_wetness(ctx.board);
            let realize = realize_equity(paired, wet);
            let to_call = state.to_call();
            (hs * pot - (1.0 - hs) * to_call) * realize
        }
        _ => {
            let pay = state.pay_for_action(config, action);
            let (paired, wet) = board_wetness(ctx.board);
            let (p_fold, p_call, p_raise) =
                bet_response_probs(pay, pot, ctx.reaction, ctx.belief_tilt);
            let call_branch = hs * (pot + pay) - (1.0 - hs) * pay;
            let raise_branch = call_branch - 0.35 * pay;
            let ev = p_fold * pot + p_call * call_branch + p_raise * raise_branch;
            apply_penalties(ev, action, state, hs, paired, wet, pot)
        }
    }
}

/// Remove dominated/over-aggressive actions before scoring. If the
/// filter would empty the set, the full legal set is restored (and a
/// warning logged) per §7's `EmptyLegalSet` recovery.
pub fn legality_prefilter(legal: &[Action], state: &HandState, hs: f64) -> Vec<Action> {
    let to_call = state.to_call();
    let req_eq = required_equity(state.pot, to_call);
    let spr = state.spr();

    let filtered: Vec<Action> = legal
        .iter()
        .copied()
        .filter(|&a| {
            if a == Action::Fold && hs > req_eq + 0.02 {
                return false;
            }
            if a == Action::AllIn && (spr > 10.0 || (spr > 2.0 && hs < 0.70)) {
                return false;
            }
            if matches!(a, Action::BetPot | Action::RaisePot) && hs < 0.60 {
                return false;
            }
            true
        })
        .collect();

    if filtered.is_empty() {
        warn!("legality pre-filter emptied the legal set; restoring full set");
        return legal.to_vec();
    }
    filtered
}

/// Post-EV conservative override: clamps lines that the deterministic
/// rules judge too aggressive for the board/SPR/hand-strength context.
pub fn conservative_override(
    chosen: Action,
    legal: &[Action],
    state: &HandState,
    hs: f64,
    board: &[Card],
) -> Action {
    let (paired, wet) = board_wetness(board);
    let dry = !paired && !wet;
    let spr = state.spr();
    let to_call = state.to_call();
    let req_eq = required_equity(state.pot, to_call);

    let has_check = legal.contains(&Action::Check);
    let has_call = legal.contains(&Action::Call);
    let passive = if has_check { Action::Check } else { Action::Call };

    if paired && (0.40..0.70).contains(&hs) && spr > 2.0 && (has_check || has_call) {
        return passive;
    }
    if chosen == Action::AllIn && spr > 1.5 && hs < 0.70 {
        return downgrade(chosen, legal, passive);
    }
    if dry && matches!(chosen, Action::BetPot | Action::RaisePot) && hs < 0.68 {
        let half = match chosen {
            Action::BetPot => Action::BetHalf,
            _ => Action::RaiseHalf,
        };
        if legal.contains(&half) {
            return half;
        }
        return passive;
    }
    if chosen.is_bet_or_raise() && hs < req_eq + 0.18 && (has_check || has_call) {
        return passive;
    }
    chosen
}

fn downgrade(chosen: Action, legal: &[Action], fallback: Action) -> Action {
    let mut candidates: Vec<Action> = legal
        .iter()
        .copied()
        .filter(|&a| a.aggression_score() < chosen.aggression_score())
        .collect();
    candidates.sort_by_key(|a| std::cmp::Reverse(a.aggression_score()));
    candidates.first().copied().unwrap_or(fallback)
}

/// Pick the max-EV action within `tolerance`, tie-breaking to the least
/// aggressive action among near-ties.
pub fn select_action(scored: &[(Action, f64)], tolerance: f64) -> Action {
    let best_ev = scored
        .iter()
        .map(|&(_, ev)| ev)
        .fold(f64::MIN, f64::max);

    let mut near_best: Vec<(Action, f64)> = scored
        .iter()
        .copied()
        .filter(|&(_, ev)| ev >= best_ev - tolerance)
        .collect();
    near_best.sort_by_key(|(a, _)| a.aggression_score());
    near_best
        .first()
        .map(|&(a, _)| a)
        .unwrap_or(Action::Fold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_is_always_zero() {
        let config = EngineConfig::default();
        let state = HandState::new_preflop(&config);
        let ctx = EvContext {
            board: &[],
            hs: 0.9,
            reaction: ReactionStats::default(),
            belief_tilt: 0.0,
        };
        assert_eq!(score_action(Action::Fold, &state, &config, &ctx), 0.0);
    }

    #[test]
    fn check_scales_with_hand_strength() {
        let config = EngineConfig::default();
        let state = HandState::new_preflop(&config);
        let ctx_weak = EvContext {
            board: &[],
            hs: 0.2,
            reaction: ReactionStats::default(),
            belief_tilt: 0.0,
        };
        let ctx_strong = EvContext {
            board: &[],
            hs: 0.8,
            reaction: ReactionStats::default(),
            belief_tilt: 0.0,
        };
        let weak_ev = score_action(Action::Check, &state, &config, &ctx_weak);
        let strong_ev = score_action(Action::Check, &state, &config, &ctx_strong);
        assert!(strong_ev > weak_ev);
    }

    #[test]
    fn select_action_prefers_less_aggressive_on_tie() {
        let scored = vec![(Action::Call, 1.0), (Action::RaisePot, 1.0)];
        assert_eq!(select_action(&scored, 0.05), Action::Call);
    }

    #[test]
    fn empty_prefilter_restores_full_set() {
        let config = EngineConfig::default();
        let mut state = HandState::new_preflop(&config);
        state.raises = config.max_raises;
        let legal = vec![Action::AllIn];
        let filtered = legality_prefilter(&legal, &state, 0.05);
        assert_eq!(filtered, legal);
    }

    #[test]
    fn pot_bet_downgrades_on_dry_board_only() {
        use crate::cards::parse_board;

        let config = EngineConfig::default();
        let mut state = HandState::new_preflop(&config);
        state.street_idx = 2;
        state.pot = 40.0;
        let legal = vec![Action::Check, Action::BetHalf, Action::BetPot, Action::AllIn];

        let dry_board = parse_board("2c7d9s").unwrap();
        let on_dry = conservative_override(Action::BetPot, &legal, &state, 0.50, &dry_board);
        assert_eq!(on_dry, Action::BetHalf);

        let wet_board = parse_board("9h8h7h").unwrap();
        let on_wet = conservative_override(Action::BetPot, &legal, &state, 0.50, &wet_board);
        assert_eq!(on_wet, Action::BetPot);
    }
}
