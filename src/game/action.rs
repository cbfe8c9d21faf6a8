//! The eight-action abstraction shared by the blueprint trainer and the
//! runtime engine.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Fold = 0,
    Check = 1,
    Call = 2,
    BetHalf = 3,
    BetPot = 4,
    RaiseHalf = 5,
    RaisePot = 6,
    AllIn = 7,
}

pub const NUM_ACTIONS: usize = 8;

pub const ALL_ACTIONS: [Action; NUM_ACTIONS] = [
    Action::Fold,
    Action::Check,
    Action::Call,
    Action::BetHalf,
    Action::BetPot,
    Action::RaiseHalf,
    Action::RaisePot,
    Action::AllIn,
];

impl Action {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Action> {
        ALL_ACTIONS.get(i).copied()
    }

    /// Aggression ordering used to tie-break EV-equal choices
    /// (FOLD<CHECK<CALL<BET_HALF<RAISE_HALF<BET_POT<RAISE_POT<ALL_IN).
    pub fn aggression_score(self) -> u8 {
        match self {
            Action::Fold => 0,
            Action::Check => 1,
            Action::Call => 2,
            Action::BetHalf => 3,
            Action::RaiseHalf => 4,
            Action::BetPot => 5,
            Action::RaisePot => 6,
            Action::AllIn => 7,
        }
    }

    pub fn is_bet_or_raise(self) -> bool {
        matches!(
            self,
            Action::BetHalf
                | Action::BetPot
                | Action::RaiseHalf
                | Action::RaisePot
                | Action::AllIn
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Fold => "FOLD",
            Action::Check => "CHECK",
            Action::Call => "CALL",
            Action::BetHalf => "BET_HALF_POT",
            Action::BetPot => "BET_POT",
            Action::RaiseHalf => "RAISE_HALF_POT",
            Action::RaisePot => "RAISE_POT",
            Action::AllIn => "ALL_IN",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggression_ordering_matches_spec() {
        let mut scores: Vec<u8> = ALL_ACTIONS.iter().map(|a| a.aggression_score()).collect();
        let sorted = {
            let mut s = scores.clone();
            s.sort_unstable();
            s
        };
        scores.sort_unstable();
        assert_eq!(scores, sorted);
    }

    #[test]
    fn index_roundtrip() {
        for a in ALL_ACTIONS {
            assert_eq!(Action::from_index(a.index()), Some(a));
        }
    }
}
