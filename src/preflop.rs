//! Preflop heuristic action mix: hand-class tiering blended with
//! opponent-tendency and equity corrections, sampled via a softmax blend
//! against EV scores. Used both by the live decision pipeline (when no
//! blueprint prior is available) and by the trainer to simulate both
//! seats up to a postflop node.

use rand::Rng;

use crate::cards::{Card, Rank};
use crate::game::Action;

/// Softmax temperature and EV/log-mix blend weight for preflop sampling.
/// Distinct from the `EV_BLEND`/temperature pair used for blueprint
/// blending postflop (§4.6): these govern the heuristic mix only.
const PREFLOP_BLEND: f64 = 0.55;
const PREFLOP_TEMPERATURE: f64 = 0.85;
const MIX_FLOOR: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Premium,
    Strong,
    Medium,
    Speculative,
    Trash,
}

/// Classify a starting hand into a tier by the exact pair/suited/high-card
/// boundary rules.
pub fn classify(hole: &[Card; 2]) -> Tier {
    let (a, b) = (hole[0].rank, hole[1].rank);
    if a == b {
        return classify_pair(a);
    }
    let (high, low) = if a.value() >= b.value() { (a, b) } else { (b, a) };
    let suited = hole[0].suit == hole[1].suit;
    classify_nonpair(high, low, suited)
}

fn classify_pair(rank: Rank) -> Tier {
    let v = rank.value();
    if v >= Rank::Queen.value() {
        Tier::Premium
    } else if v >= Rank::Nine.value() {
        Tier::Strong
    } else if v >= Rank::Six.value() {
        Tier::Medium
    } else {
        Tier::Speculative
    }
}

fn classify_nonpair(high: Rank, low: Rank, suited: bool) -> Tier {
    let (h, l) = (high.value(), low.value());
    let gap = h - l - 1;

    if suited && h == Rank::Ace.value() && l >= Rank::Ten.value() {
        return Tier::Premium;
    }
    if h == Rank::Ace.value() && l >= Rank::Queen.value() {
        return Tier::Strong;
    }
    if suited && h >= Rank::King.value() && l >= Rank::Ten.value() {
        return Tier::Strong;
    }
    if h >= Rank::King.value() && l >= Rank::Jack.value() {
        return Tier::Medium;
    }
    if suited && gap <= 2 && h >= Rank::Nine.value() {
        return Tier::Medium;
    }
    if suited && h == Rank::Ace.value() {
        return Tier::Medium;
    }
    if gap <= 1 && h >= Rank::Ten.value() {
        return Tier::Speculative;
    }
    if suited && h >= Rank::Nine.value() {
        return Tier::Speculative;
    }
    Tier::Trash
}

/// Raise / call / passive (fold-or-check) mass, before action-level
/// splitting.
#[derive(Debug, Clone, Copy)]
pub struct ActionMix {
    pub raise: f64,
    pub call: f64,
    pub passive: f64,
}

impl ActionMix {
    fn normalize(mut self) -> Self {
        self.raise = self.raise.max(0.0);
        self.call = self.call.max(0.0);
        self.passive = self.passive.max(0.0);
        let total = (self.raise + self.call + self.passive).max(1e-9);
        self.raise /= total;
        self.call /= total;
        self.passive /= total;
        self
    }
}

fn base_mix(tier: Tier, facing_raise: bool) -> ActionMix {
    let (raise, call, passive) = match (tier, facing_raise) {
        (Tier::Premium, false) => (0.85, 0.10, 0.05),
        (Tier::Premium, true) => (0.70, 0.25, 0.05),
        (Tier::Strong, false) => (0.65, 0.25, 0.10),
        (Tier::Strong, true) => (0.45, 0.35, 0.20),
        (Tier::Medium, false) => (0.40, 0.35, 0.25),
        (Tier::Medium, true) => (0.20, 0.30, 0.50),
        (Tier::Speculative, false) => (0.20, 0.40, 0.40),
        (Tier::Speculative, true) => (0.08, 0.22, 0.70),
        (Tier::Trash, false) => (0.05, 0.15, 0.80),
        (Tier::Trash, true) => (0.02, 0.08, 0.90),
    };
    ActionMix { raise, call, passive }
}

/// Opponent tendency summary used for the opponent-tendency correction.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpponentTendency {
    pub threebet_rate: f64,
    pub call_vs_raise_rate: f64,
    pub samples: u32,
}

/// Build the raise/call/passive mix for a tier, applying the equity and
/// opponent-tendency corrections from §4.4.
pub fn action_mix(
    tier: Tier,
    facing_raise: bool,
    hs: f64,
    tendency: &OpponentTendency,
) -> ActionMix {
    let mut mix = base_mix(tier, facing_raise);

    if hs > 0.62 {
        mix.raise += 0.08;
        mix.passive -= 0.08;
    } else if hs < 0.42 {
        mix.raise -= 0.08;
        mix.passive += 0.08;
    }

    if tendency.samples >= 8 {
        if tendency.threebet_rate > 0.28 {
            mix.call += 0.06;
            mix.raise -= 0.06;
        } else if tendency.threebet_rate < 0.10 && tendency.call_vs_raise_rate > 0.5 {
            mix.raise += 0.06;
            mix.passive -= 0.06;
        }
    }

    mix.normalize()
}

/// Per-action probabilities derived from the raise/call/passive mix,
/// restricted to `legal` actions and renormalized.
pub fn distribute_over_actions(
    mix: ActionMix,
    hs: f64,
    facing_raise: bool,
    legal: &[Action],
) -> Vec<(Action, f64)> {
    let allin_carveout = if hs > 0.80 { mix.raise * 0.15 } else { 0.0 };
    let split_raise = (mix.raise - allin_carveout).max(0.0);

    let passive_action = if facing_raise { Action::Fold } else { Action::Check };

    let mut weights: Vec<(Action, f64)> = vec![
        (Action::RaiseHalf, split_raise * 0.5),
        (Action::RaisePot, split_raise * 0.5),
        (Action::AllIn, allin_carveout),
        (Action::Call, mix.call),
        (passive_action, mix.passive),
    ];

    weights.retain(|(a, _)| legal.contains(a));
    let total: f64 = weights.iter().map(|(_, w)| *w).sum();
    if total <= 1e-9 {
        let uniform = 1.0 / legal.len().max(1) as f64;
        return legal.iter().map(|&a| (a, uniform)).collect();
    }
    weights.iter().map(|(a, w)| (*a, w / total)).collect()
}

/// Sample a preflop action from a softmax blend of EV scores and the
/// log-probability of the heuristic mix.
pub fn sample_preflop_action<R: Rng + ?Sized>(
    mix_weights: &[(Action, f64)],
    ev: &dyn Fn(Action) -> f64,
    rng: &mut R,
) -> Action {
    let scores: Vec<(Action, f64)> = mix_weights
        .iter()
        .map(|&(a, w)| {
            let log_mix = w.max(MIX_FLOOR).ln();
            let score = PREFLOP_BLEND * ev(a) + (1.0 - PREFLOP_BLEND) * log_mix;
            (a, score / PREFLOP_TEMPERATURE)
        })
        .collect();

    let max_score = scores.iter().map(|&(_, s)| s).fold(f64::MIN, f64::max);
    let exps: Vec<(Action, f64)> = scores
        .iter()
        .map(|&(a, s)| (a, (s - max_score).exp()))
        .collect();
    let total: f64 = exps.iter().map(|&(_, e)| e).sum();

    let mut draw: f64 = rng.gen_range(0.0..total);
    for (a, e) in &exps {
        if draw < *e {
            return *a;
        }
        draw -= e;
    }
    exps.last().map(|&(a, _)| a).unwrap_or(Action::Fold)
}

/// Plain weighted sample over an action/weight distribution, used by the
/// trainer's preflop-only simulation where no EV vector is available yet.
pub fn sample_from_weights<R: Rng + ?Sized>(weights: &[(Action, f64)], rng: &mut R) -> Action {
    let total: f64 = weights.iter().map(|&(_, w)| w).sum();
    if total <= 1e-12 {
        return weights.first().map(|&(a, _)| a).unwrap_or(Action::Fold);
    }
    let mut draw = rng.gen_range(0.0..total);
    for &(a, w) in weights {
        if draw < w {
            return a;
        }
        draw -= w;
    }
    weights.last().map(|&(a, _)| a).unwrap_or(Action::Fold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_hole;

    #[test]
    fn pocket_aces_is_premium() {
        let hole = parse_hole("AsAd").unwrap();
        assert_eq!(classify(&hole), Tier::Premium);
    }

    #[test]
    fn suited_broadway_ace_is_premium() {
        let hole = parse_hole("AhTh").unwrap();
        assert_eq!(classify(&hole), Tier::Premium);
    }

    #[test]
    fn seven_deuce_offsuit_is_trash() {
        let hole = parse_hole("7c2d").unwrap();
        assert_eq!(classify(&hole), Tier::Trash);
    }

    #[test]
    fn mix_normalizes_to_one() {
        let mix = action_mix(Tier::Strong, false, 0.55, &OpponentTendency::default());
        let total = mix.raise + mix.call + mix.passive;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn high_hs_adds_allin_carveout() {
        let mix = ActionMix {
            raise: 0.8,
            call: 0.1,
            passive: 0.1,
        };
        let legal = vec![
            Action::RaiseHalf,
            Action::RaisePot,
            Action::AllIn,
            Action::Call,
            Action::Fold,
        ];
        let dist = distribute_over_actions(mix, 0.90, true, &legal);
        let allin_w = dist
            .iter()
            .find(|(a, _)| *a == Action::AllIn)
            .map(|(_, w)| *w)
            .unwrap_or(0.0);
        assert!(allin_w > 0.0);
    }
}
