//! Baseline controllers producing transfer actions from observations.
//!
//! These stand in for a trained agent when running episodes from the
//! command line and give a reference point to compare learned policies
//! against.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::sim::env::{AMBIENT_OBSERVATION_LEN, BUILDING_OBSERVATION_LEN};
use crate::sim::types::{Action, TransferMode};

/// Shape of the action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionShape {
    pub buildings: usize,
    pub mode: TransferMode,
}

/// A policy choosing one action per tick.
pub trait Controller {
    /// Chooses the action for the next tick.
    ///
    /// # Arguments
    ///
    /// * `observation` - Current observation vector
    /// * `shape` - Number of buildings and the expected action variant
    fn act(&mut self, observation: &[f64], shape: ActionShape) -> Action;

    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;
}

/// Never transfers anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdlePolicy;

impl Controller for IdlePolicy {
    fn act(&mut self, _observation: &[f64], shape: ActionShape) -> Action {
        Action::idle(shape.mode, shape.buildings)
    }

    fn name(&self) -> &'static str {
        "idle"
    }
}

/// Uniformly random transfers.
///
/// Absolute amounts are drawn from `[0, max_amount_kwh)`, share levels
/// from {0, 1, 2}.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
    max_amount_kwh: f64,
}

impl RandomPolicy {
    pub fn new(seed: u64, max_amount_kwh: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_amount_kwh: max_amount_kwh.max(0.0),
        }
    }
}

impl Controller for RandomPolicy {
    fn act(&mut self, _observation: &[f64], shape: ActionShape) -> Action {
        let len = shape.buildings * shape.buildings;
        match shape.mode {
            TransferMode::Absolute => Action::Continuous(
                (0..len)
                    .map(|_| self.rng.random::<f64>() * self.max_amount_kwh)
                    .collect(),
            ),
            TransferMode::Share => {
                Action::Discrete((0..len).map(|_| self.rng.random_range(0..=2)).collect())
            }
        }
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Sends last tick's surplus from producing buildings to buildings in deficit.
///
/// Reads `[produced, consumption, stored]` per building from the
/// observation. In absolute mode the surplus is split in proportion to each
/// receiver's deficit; in share mode every surplus building sends all it
/// has to the neediest building.
#[derive(Debug, Default, Clone, Copy)]
pub struct SurplusSharingPolicy;

impl SurplusSharingPolicy {
    fn balances(observation: &[f64], buildings: usize) -> Vec<f64> {
        (0..buildings)
            .map(|i| {
                let base = AMBIENT_OBSERVATION_LEN + i * BUILDING_OBSERVATION_LEN;
                match observation.get(base..base + 2) {
                    Some([produced, consumption]) => produced - consumption,
                    _ => 0.0,
                }
            })
            .collect()
    }
}

impl Controller for SurplusSharingPolicy {
    fn act(&mut self, observation: &[f64], shape: ActionShape) -> Action {
        let n = shape.buildings;
        let balances = Self::balances(observation, n);
        let surplus: f64 = balances.iter().filter(|b| **b > 0.0).sum();
        let deficit: f64 = balances.iter().filter(|b| **b < 0.0).map(|b| -b).sum();

        if surplus <= 0.0 || deficit <= 0.0 {
            return Action::idle(shape.mode, n);
        }

        match shape.mode {
            TransferMode::Absolute => {
                let moved = surplus.min(deficit);
                let mut amounts = vec![0.0; n * n];
                for (s, &give) in balances.iter().enumerate().filter(|(_, b)| **b > 0.0) {
                    for (d, &need) in balances.iter().enumerate().filter(|(_, b)| **b < 0.0) {
                        amounts[s * n + d] = moved * (give / surplus) * (-need / deficit);
                    }
                }
                Action::Continuous(amounts)
            }
            TransferMode::Share => {
                let mut levels = vec![0; n * n];
                let neediest = balances
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i);
                if let Some(d) = neediest {
                    for (s, _) in balances.iter().enumerate().filter(|(_, b)| **b > 0.0) {
                        levels[s * n + d] = 2;
                    }
                }
                Action::Discrete(levels)
            }
        }
    }

    fn name(&self) -> &'static str {
        "sharing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(buildings: &[(f64, f64)]) -> Vec<f64> {
        let mut obs = vec![1.0, 0.5, 0.0];
        for &(produced, consumption) in buildings {
            obs.extend_from_slice(&[produced, consumption, 0.0]);
        }
        obs
    }

    const ABSOLUTE_2: ActionShape = ActionShape {
        buildings: 2,
        mode: TransferMode::Absolute,
    };

    #[test]
    fn idle_sends_nothing() {
        let action = IdlePolicy.act(&observation(&[(5.0, 1.0), (0.0, 1.0)]), ABSOLUTE_2);
        assert_eq!(action, Action::Continuous(vec![0.0; 4]));
    }

    #[test]
    fn random_respects_mode_and_bounds() {
        let mut policy = RandomPolicy::new(3, 2.0);
        match policy.act(&[], ABSOLUTE_2) {
            Action::Continuous(v) => {
                assert_eq!(v.len(), 4);
                assert!(v.iter().all(|x| (0.0..2.0).contains(x)));
            }
            other => panic!("unexpected {other:?}"),
        }
        let shape = ActionShape {
            buildings: 3,
            mode: TransferMode::Share,
        };
        match policy.act(&[], shape) {
            Action::Discrete(v) => {
                assert_eq!(v.len(), 9);
                assert!(v.iter().all(|&l| l <= 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sharing_splits_surplus_by_deficit() {
        // Building 0 has 3 kWh spare, building 1 needs 1, building 2 needs 3
        let obs = observation(&[(4.0, 1.0), (0.0, 1.0), (0.0, 3.0)]);
        let shape = ActionShape {
            buildings: 3,
            mode: TransferMode::Absolute,
        };
        let Action::Continuous(amounts) = SurplusSharingPolicy.act(&obs, shape) else {
            panic!("expected continuous action");
        };
        assert!((amounts[1] - 0.75).abs() < 1e-12);
        assert!((amounts[2] - 2.25).abs() < 1e-12);
        assert_eq!(amounts[3..].iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn sharing_targets_neediest_in_share_mode() {
        let obs = observation(&[(4.0, 1.0), (0.0, 1.0), (0.0, 3.0)]);
        let shape = ActionShape {
            buildings: 3,
            mode: TransferMode::Share,
        };
        assert_eq!(
            SurplusSharingPolicy.act(&obs, shape),
            Action::Discrete(vec![0, 0, 2, 0, 0, 0, 0, 0, 0])
        );
    }

    #[test]
    fn sharing_is_idle_without_surplus() {
        let obs = observation(&[(0.0, 1.0), (0.0, 1.0)]);
        assert_eq!(
            SurplusSharingPolicy.act(&obs, ABSOLUTE_2),
            Action::Continuous(vec![0.0; 4])
        );
    }
}
