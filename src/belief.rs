//! Per-seat opponent range belief: a categorical over {weak, medium,
//! strong}, nudged by each observed action and used to tilt both the EV
//! scorer's response model and raw equity.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BettingContext {
    FacingBet,
    Unopened,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedReaction {
    Fold,
    Passive,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpponentRangeBelief {
    pub weak: f64,
    pub medium: f64,
    pub strong: f64,
}

impl Default for OpponentRangeBelief {
    fn default() -> Self {
        OpponentRangeBelief {
            weak: 1.0 / 3.0,
            medium: 1.0 / 3.0,
            strong: 1.0 / 3.0,
        }
    }
}

impl OpponentRangeBelief {
    /// `strong − weak`, the tilt the EV scorer blends into its bet/raise
    /// response model.
    pub fn tilt(&self) -> f64 {
        self.strong - self.weak
    }

    pub fn update(&mut self, context: BettingContext, reaction: ObservedReaction) {
        let (dw, dm, ds) = match (context, reaction) {
            (BettingContext::FacingBet, ObservedReaction::Fold) => (0.20, 0.04, -0.24),
            (BettingContext::FacingBet, ObservedReaction::Passive) => (-0.05, 0.12, -0.07),
            (BettingContext::FacingBet, ObservedReaction::Aggressive) => (-0.16, -0.04, 0.20),
            (BettingContext::Unopened, ObservedReaction::Passive) => (0.10, 0.02, -0.12),
            (BettingContext::Unopened, ObservedReaction::Aggressive) => (-0.12, -0.02, 0.14),
            (BettingContext::Unopened, ObservedReaction::Fold) => (0.0, 0.0, 0.0),
        };
        self.weak += dw;
        self.medium += dm;
        self.strong += ds;
        self.normalize();
    }

    fn normalize(&mut self) {
        self.weak = self.weak.max(0.0);
        self.medium = self.medium.max(0.0);
        self.strong = self.strong.max(0.0);
        let total = (self.weak + self.medium + self.strong).max(1e-9);
        self.weak /= total;
        self.medium /= total;
        self.strong /= total;
    }
}

/// Adjust raw hand-strength by the belief's deviation from a uniform
/// prior: facing a range skewed strong lowers conditioned hs, skewed weak
/// raises it.
pub fn conditioned_equity(hs: f64, belief: &OpponentRangeBelief) -> f64 {
    let adjustment = -0.11 * (belief.strong - belief.weak) + 0.02 * (belief.medium - 0.33);
    (hs + adjustment).clamp(0.001, 0.999)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_uniform() {
        let belief = OpponentRangeBelief::default();
        assert!((belief.weak - 1.0 / 3.0).abs() < 1e-9);
        assert!((belief.weak + belief.medium + belief.strong - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalization_always_sums_to_one() {
        let mut belief = OpponentRangeBelief::default();
        for _ in 0..20 {
            belief.update(BettingContext::FacingBet, ObservedReaction::Fold);
        }
        assert!((belief.weak + belief.medium + belief.strong - 1.0).abs() < 1e-9);
        assert!(belief.weak >= 0.0 && belief.medium >= 0.0 && belief.strong >= 0.0);
    }

    #[test]
    fn folding_a_lot_skews_toward_weak() {
        let mut belief = OpponentRangeBelief::default();
        for _ in 0..5 {
            belief.update(BettingContext::FacingBet, ObservedReaction::Fold);
        }
        assert!(belief.weak > belief.strong);
    }

    #[test]
    fn conditioned_equity_stays_in_bounds() {
        let belief = OpponentRangeBelief {
            weak: 0.0,
            medium: 0.0,
            strong: 1.0,
        };
        let hs = conditioned_equity(0.95, &belief);
        assert!((0.001..=0.999).contains(&hs));
    }
}
