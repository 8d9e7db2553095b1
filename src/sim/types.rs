//! Core environment types: actions, transfer matrices, step results and errors.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::devices::types::TransferRequest;
use crate::sim::weather::WeatherError;

/// How a controller action is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Each component is an absolute energy amount in kWh.
    #[default]
    Absolute,
    /// Each component is a share level in {0, 1, 2} → {0 %, 50 %, 100 %}.
    Share,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute => write!(f, "absolute"),
            Self::Share => write!(f, "share"),
        }
    }
}

/// Flat controller action of length N², reshaped row-major
/// (row = source building, column = destination building).
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Continuous(Vec<f64>),
    Discrete(Vec<u8>),
}

impl Action {
    /// An all-zero action of the given mode for `n` buildings.
    pub fn idle(mode: TransferMode, n: usize) -> Self {
        match mode {
            TransferMode::Absolute => Self::Continuous(vec![0.0; n * n]),
            TransferMode::Share => Self::Discrete(vec![0; n * n]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Continuous(v) => v.len(),
            Self::Discrete(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The transfer mode this action belongs to.
    pub fn mode(&self) -> TransferMode {
        match self {
            Self::Continuous(_) => TransferMode::Absolute,
            Self::Discrete(_) => TransferMode::Share,
        }
    }

    /// Validates the action against the environment contract and converts
    /// it into row-major transfer requests.
    ///
    /// Negative amounts and share levels above 2 are accepted here and
    /// clamped when the request is applied.
    ///
    /// # Errors
    ///
    /// Returns a [`StepError`] for a wrong length, a mode mismatch, or a
    /// non-finite amount.
    pub fn to_requests(
        &self,
        mode: TransferMode,
        buildings: usize,
    ) -> Result<Vec<TransferRequest>, StepError> {
        let expected = buildings * buildings;
        if self.len() != expected {
            return Err(StepError::ActionLength {
                expected,
                got: self.len(),
            });
        }
        if self.mode() != mode {
            return Err(StepError::ModeMismatch {
                expected: mode,
                got: self.mode(),
            });
        }

        match self {
            Self::Continuous(amounts) => amounts
                .iter()
                .enumerate()
                .map(|(index, &value)| {
                    if value.is_finite() {
                        Ok(TransferRequest::Amount(value))
                    } else {
                        Err(StepError::NonFiniteAmount { index, value })
                    }
                })
                .collect(),
            Self::Discrete(levels) => Ok(levels
                .iter()
                .map(|&level| TransferRequest::Share(level))
                .collect()),
        }
    }
}

/// Square matrix of energy amounts (kWh) between buildings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransferMatrix {
    size: usize,
    cells: Vec<f64>,
}

impl TransferMatrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            cells: vec![0.0; size * size],
        }
    }

    /// Number of buildings (rows and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Energy sent from `source` to `destination`.
    ///
    /// # Panics
    ///
    /// Panics if either index is not below [`TransferMatrix::size`].
    pub fn get(&self, source: usize, destination: usize) -> f64 {
        self.cells[self.index(source, destination)]
    }

    /// Overwrites one cell.
    ///
    /// # Panics
    ///
    /// Panics if either index is not below [`TransferMatrix::size`].
    pub fn set(&mut self, source: usize, destination: usize, value: f64) {
        let index = self.index(source, destination);
        self.cells[index] = value;
    }

    fn index(&self, source: usize, destination: usize) -> usize {
        assert!(
            source < self.size && destination < self.size,
            "cell ({source}, {destination}) outside {n}x{n} transfer matrix",
            n = self.size
        );
        source * self.size + destination
    }

    /// Row `source` as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `source` is not below [`TransferMatrix::size`].
    pub fn row(&self, source: usize) -> &[f64] {
        &self.cells[source * self.size..(source + 1) * self.size]
    }

    /// Total released by `source`.
    ///
    /// # Panics
    ///
    /// Panics if `source` is not below [`TransferMatrix::size`].
    pub fn row_sum(&self, source: usize) -> f64 {
        self.row(source).iter().sum()
    }

    /// Total received by `destination`.
    ///
    /// # Panics
    ///
    /// Panics if `destination` is not below [`TransferMatrix::size`].
    pub fn column_sum(&self, destination: usize) -> f64 {
        (0..self.size).map(|s| self.get(s, destination)).sum()
    }

    /// Energy moved between distinct buildings (diagonal excluded).
    pub fn off_diagonal_total(&self) -> f64 {
        let mut total = 0.0;
        for s in 0..self.size {
            for d in 0..self.size {
                if s != d {
                    total += self.get(s, d);
                }
            }
        }
        total
    }
}

/// Diagnostics returned alongside each step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Ambient hour after the step.
    pub hour: usize,
    /// Euros spent on grid energy during the settled tick.
    pub power_bought: f64,
    /// Grid energy bought per building (kWh), indexed like the buildings.
    pub purchased_kwh: Vec<f64>,
    /// Energy actually released per (source, destination) pair.
    pub released: TransferMatrix,
}

/// Result of [`GridEnvironment::step`](crate::sim::env::GridEnvironment::step).
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Vec<f64>,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

/// Compact per-step record collected by the runner and exported to CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    /// Ambient hour after the step.
    pub hour: usize,
    /// Reward for the step.
    pub reward: f64,
    /// Grid cost of the settled tick (EUR).
    pub grid_cost: f64,
    /// Total grid energy bought by all buildings (kWh).
    pub purchased_kwh: f64,
    /// Number of buildings that bought a positive amount.
    pub buying_buildings: usize,
    /// Energy moved between distinct buildings (kWh).
    pub transferred_kwh: f64,
    /// Whether the horizon was reached.
    pub done: bool,
}

impl StepRecord {
    pub fn from_outcome(outcome: &StepOutcome) -> Self {
        let info = &outcome.info;
        Self {
            hour: info.hour,
            reward: outcome.reward,
            grid_cost: info.power_bought,
            purchased_kwh: info.purchased_kwh.iter().sum(),
            buying_buildings: info.purchased_kwh.iter().filter(|&&kwh| kwh > 0.0).count(),
            transferred_kwh: info.released.off_diagonal_total(),
            done: outcome.done,
        }
    }
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>5} | reward={:>8.3} | grid={:>7.4} EUR ({:>6.3} kWh, {} buying) | \
             transferred={:>6.3} kWh{}",
            self.hour,
            self.reward,
            self.grid_cost,
            self.purchased_kwh,
            self.buying_buildings,
            self.transferred_kwh,
            if self.done { " | done" } else { "" },
        )
    }
}

/// Controller contract violations rejected by `step`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error("action has {got} components, expected {expected} (buildings squared)")]
    ActionLength { expected: usize, got: usize },
    #[error("{got} action given to an environment expecting {expected} transfers")]
    ModeMismatch {
        expected: TransferMode,
        got: TransferMode,
    },
    #[error("action component {index} is not finite ({value})")]
    NonFiniteAmount { index: usize, value: f64 },
    #[error("episode finished at hour {hour}; call reset first")]
    EpisodeOver { hour: usize },
}

/// Failures while building or resetting an environment.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("invalid configuration ({} error(s)): {}", .0.len(), first_message(.0))]
    InvalidConfig(Vec<ConfigError>),
    #[error(transparent)]
    Weather(#[from] WeatherError),
}

fn first_message(errors: &[ConfigError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}
