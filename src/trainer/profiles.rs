//! Rule-based opponents used to evaluate checkpointed policies (§4.10).
//! Each action choice is a deterministic function of the legal set, the
//! amount owed, the pot, and a uniform random draw — no hand-strength
//! awareness, by design.

use rand::Rng;

use crate::ev::required_equity;
use crate::game::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentProfile {
    Nit,
    Station,
    Aggro,
    PotOdds,
}

pub const ALL_PROFILES: [OpponentProfile; 4] = [
    OpponentProfile::Nit,
    OpponentProfile::Station,
    OpponentProfile::Aggro,
    OpponentProfile::PotOdds,
];

impl OpponentProfile {
    pub fn label(self) -> &'static str {
        match self {
            OpponentProfile::Nit => "nit",
            OpponentProfile::Station => "station",
            OpponentProfile::Aggro => "aggro",
            OpponentProfile::PotOdds => "pot_odds",
        }
    }
}

fn most_aggressive(legal: &[Action]) -> Option<Action> {
    legal
        .iter()
        .copied()
        .filter(|a| a.is_bet_or_raise())
        .max_by_key(|a| a.aggression_score())
}

fn passive_fallback(legal: &[Action]) -> Action {
    if legal.contains(&Action::Check) {
        Action::Check
    } else if legal.contains(&Action::Call) {
        Action::Call
    } else {
        Action::Fold
    }
}

pub fn choose_action<R: Rng + ?Sized>(
    profile: OpponentProfile,
    legal: &[Action],
    to_call: f64,
    pot: f64,
    rng: &mut R,
) -> Action {
    let facing_bet = to_call > 1e-9;
    let r: f64 = rng.gen();

    let chosen = match (profile, facing_bet) {
        (OpponentProfile::Nit, true) => {
            if r < 0.65 {
                Action::Fold
            } else if r < 0.95 {
                Action::Call
            } else {
                most_aggressive(legal).unwrap_or(Action::Call)
            }
        }
        (OpponentProfile::Nit, false) => {
            if r < 0.75 {
                passive_fallback(legal)
            } else {
                most_aggressive(legal).unwrap_or_else(|| passive_fallback(legal))
            }
        }
        (OpponentProfile::Station, true) => {
            if r < 0.05 {
                Action::Fold
            } else if r < 0.90 {
                Action::Call
            } else {
                most_aggressive(legal).unwrap_or(Action::Call)
            }
        }
        (OpponentProfile::Station, false) => {
            if r < 0.85 {
                passive_fallback(legal)
            } else {
                most_aggressive(legal).unwrap_or_else(|| passive_fallback(legal))
            }
        }
        (OpponentProfile::Aggro, true) => {
            if r < 0.10 {
                Action::Fold
            } else if r < 0.45 {
                Action::Call
            } else {
                most_aggressive(legal).unwrap_or(Action::Call)
            }
        }
        (OpponentProfile::Aggro, false) => {
            if r < 0.30 {
                passive_fallback(legal)
            } else {
                most_aggressive(legal).unwrap_or_else(|| passive_fallback(legal))
            }
        }
        (OpponentProfile::PotOdds, true) => {
            if required_equity(pot, to_call) <= 0.33 {
                Action::Call
            } else {
                Action::Fold
            }
        }
        (OpponentProfile::PotOdds, false) => passive_fallback(legal),
    };

    if legal.contains(&chosen) {
        chosen
    } else {
        passive_fallback(legal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pot_odds_profile_is_deterministic_given_state() {
        let legal = vec![Action::Fold, Action::Call, Action::RaisePot];
        let mut rng = StdRng::seed_from_u64(1);
        let a1 = choose_action(OpponentProfile::PotOdds, &legal, 10.0, 100.0, &mut rng);
        let a2 = choose_action(OpponentProfile::PotOdds, &legal, 10.0, 100.0, &mut rng);
        assert_eq!(a1, Action::Call);
        assert_eq!(a2, Action::Call);
    }

    #[test]
    fn pot_odds_folds_when_price_is_too_high() {
        let legal = vec![Action::Fold, Action::Call];
        let mut rng = StdRng::seed_from_u64(2);
        let a = choose_action(OpponentProfile::PotOdds, &legal, 90.0, 100.0, &mut rng);
        assert_eq!(a, Action::Fold);
    }

    #[test]
    fn chosen_action_is_always_legal() {
        let legal = vec![Action::Check, Action::BetHalf];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            for profile in ALL_PROFILES {
                let a = choose_action(profile, &legal, 0.0, 40.0, &mut rng);
                assert!(legal.contains(&a));
            }
        }
    }
}
