//! Reward functions mapping the grid cost of one tick to a scalar.
//!
//! Every variant is monotonically non-increasing in the grid cost for a fixed
//! purchase history.

use serde::Deserialize;

/// Selectable reward function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    /// `-100 × cost` when anything was bought, `+100` otherwise.
    #[default]
    Simple,
    /// Compares the cost against the running mean and max of the history,
    /// with bonuses for (near-)zero purchase.
    Relative,
    /// Three-level reward in [-1, 1].
    Normalized,
}

impl RewardKind {
    const SIMPLE_PENALTY_PER_EUR: f64 = 100.0;
    const SIMPLE_BONUS: f64 = 100.0;

    const RELATIVE_MEAN_STEP: f64 = 10.0;
    const RELATIVE_NEW_MAX_PENALTY: f64 = 100.0;
    const RELATIVE_LOW_COST_THRESHOLD: f64 = 0.2;
    const RELATIVE_LOW_COST_BONUS: f64 = 90.0;
    const RELATIVE_ZERO_COST_BONUS: f64 = 1000.0;

    /// Evaluates the reward for `power_bought` euros.
    ///
    /// # Arguments
    ///
    /// * `power_bought` - Grid cost of the tick just settled
    /// * `history` - Grid costs of all previous ticks (not yet including this one)
    pub fn evaluate(self, power_bought: f64, history: &[f64]) -> f64 {
        match self {
            Self::Simple => {
                if power_bought > 0.0 {
                    -Self::SIMPLE_PENALTY_PER_EUR * power_bought
                } else {
                    Self::SIMPLE_BONUS
                }
            }
            Self::Relative => {
                let (mean, max) = mean_and_max(history);
                let mut reward = if power_bought > mean {
                    -Self::RELATIVE_MEAN_STEP
                } else {
                    Self::RELATIVE_MEAN_STEP
                };
                if power_bought > max {
                    reward -= Self::RELATIVE_NEW_MAX_PENALTY;
                }
                if power_bought <= Self::RELATIVE_LOW_COST_THRESHOLD {
                    reward += Self::RELATIVE_LOW_COST_BONUS;
                }
                if power_bought == 0.0 {
                    reward += Self::RELATIVE_ZERO_COST_BONUS;
                }
                reward
            }
            Self::Normalized => {
                let (mean, _) = mean_and_max(history);
                if power_bought <= 0.0 {
                    1.0
                } else if power_bought > mean {
                    -1.0
                } else {
                    -0.5
                }
            }
        }
    }

    /// Largest reward attainable, reached when nothing is bought.
    pub fn max_reward(self) -> f64 {
        match self {
            Self::Simple => Self::SIMPLE_BONUS,
            Self::Relative => {
                Self::RELATIVE_MEAN_STEP
                    + Self::RELATIVE_LOW_COST_BONUS
                    + Self::RELATIVE_ZERO_COST_BONUS
            }
            Self::Normalized => 1.0,
        }
    }
}

/// Mean and max of the history; an empty history counts as a single zero.
fn mean_and_max(history: &[f64]) -> (f64, f64) {
    if history.is_empty() {
        return (0.0, 0.0);
    }
    let sum: f64 = history.iter().sum();
    let max = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (sum / history.len() as f64, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [RewardKind; 3] = [
        RewardKind::Simple,
        RewardKind::Relative,
        RewardKind::Normalized,
    ];

    #[test]
    fn simple_reward_values() {
        assert_eq!(RewardKind::Simple.evaluate(0.0, &[0.0]), 100.0);
        assert!((RewardKind::Simple.evaluate(0.25, &[0.0]) + 25.0).abs() < 1e-12);
    }

    #[test]
    fn relative_reward_values() {
        let history = [0.0, 0.4, 0.8];
        // Zero purchase: below mean, low-cost and zero bonuses
        assert_eq!(RewardKind::Relative.evaluate(0.0, &history), 1100.0);
        // Low but non-zero
        assert_eq!(RewardKind::Relative.evaluate(0.1, &history), 100.0);
        // Above mean, below max
        assert_eq!(RewardKind::Relative.evaluate(0.5, &history), -10.0);
        // New maximum
        assert_eq!(RewardKind::Relative.evaluate(1.0, &history), -110.0);
    }

    #[test]
    fn normalized_reward_values() {
        let history = [0.0, 0.2, 0.4];
        assert_eq!(RewardKind::Normalized.evaluate(0.0, &history), 1.0);
        assert_eq!(RewardKind::Normalized.evaluate(0.1, &history), -0.5);
        assert_eq!(RewardKind::Normalized.evaluate(0.3, &history), -1.0);
    }

    #[test]
    fn zero_purchase_hits_max_reward() {
        let history = [0.0, 1.0, 2.0];
        for kind in KINDS {
            assert_eq!(kind.evaluate(0.0, &history), kind.max_reward(), "{kind:?}");
        }
    }

    #[test]
    fn rewards_are_monotone_in_cost() {
        let histories: [&[f64]; 3] = [&[0.0], &[0.0, 0.3, 0.1], &[0.0, 2.0, 5.0, 0.05]];
        for kind in KINDS {
            for history in histories {
                let mut previous = f64::INFINITY;
                for i in 0..=600 {
                    let cost = f64::from(i) * 0.01;
                    let reward = kind.evaluate(cost, history);
                    assert!(
                        reward <= previous,
                        "{kind:?} increased at cost {cost} with history {history:?}"
                    );
                    previous = reward;
                }
            }
        }
    }

    #[test]
    fn empty_history_counts_as_zero() {
        assert_eq!(RewardKind::Normalized.evaluate(0.1, &[]), -1.0);
        assert_eq!(RewardKind::Relative.evaluate(0.0, &[]), 1100.0);
    }
}
