//! Post-hoc KPI computation from episode records.

use std::fmt;

use super::types::StepRecord;

/// Aggregate indicators derived from a complete episode.
///
/// Computed post-hoc from `Vec<StepRecord>` so the report always agrees with
/// the exported step data.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    /// Number of settled ticks.
    pub steps: usize,
    /// Sum of rewards.
    pub total_reward: f64,
    /// Mean reward per tick.
    pub mean_reward: f64,
    /// Total grid cost (EUR).
    pub total_grid_cost: f64,
    /// Highest grid cost of a single tick (EUR).
    pub peak_hourly_cost: f64,
    /// Total grid energy bought (kWh).
    pub total_purchased_kwh: f64,
    /// Ticks in which anything was bought.
    pub hours_with_purchase: usize,
    /// Share of ticks without any purchase (0.0 to 1.0).
    pub self_sufficient_share: f64,
    /// Energy moved between distinct buildings (kWh).
    pub total_transferred_kwh: f64,
}

impl EpisodeReport {
    /// Computes all KPIs from the step records of one episode.
    ///
    /// # Returns
    ///
    /// An all-zero report for an empty episode.
    pub fn from_records(records: &[StepRecord]) -> Self {
        if records.is_empty() {
            return Self {
                steps: 0,
                total_reward: 0.0,
                mean_reward: 0.0,
                total_grid_cost: 0.0,
                peak_hourly_cost: 0.0,
                total_purchased_kwh: 0.0,
                hours_with_purchase: 0,
                self_sufficient_share: 0.0,
                total_transferred_kwh: 0.0,
            };
        }

        let n = records.len() as f64;
        let mut total_reward = 0.0;
        let mut total_grid_cost = 0.0;
        let mut peak_hourly_cost = 0.0_f64;
        let mut total_purchased_kwh = 0.0;
        let mut hours_with_purchase = 0;
        let mut total_transferred_kwh = 0.0;

        for r in records {
            total_reward += r.reward;
            total_grid_cost += r.grid_cost;
            peak_hourly_cost = peak_hourly_cost.max(r.grid_cost);
            total_purchased_kwh += r.purchased_kwh;
            total_transferred_kwh += r.transferred_kwh;
            if r.purchased_kwh > 0.0 {
                hours_with_purchase += 1;
            }
        }

        Self {
            steps: records.len(),
            total_reward,
            mean_reward: total_reward / n,
            total_grid_cost,
            peak_hourly_cost,
            total_purchased_kwh,
            hours_with_purchase,
            self_sufficient_share: (records.len() - hours_with_purchase) as f64 / n,
            total_transferred_kwh,
        }
    }
}

impl fmt::Display for EpisodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Episode Report ---")?;
        writeln!(f, "Steps:                 {}", self.steps)?;
        writeln!(
            f,
            "Reward:                {:.2} total, {:.3} mean",
            self.total_reward, self.mean_reward
        )?;
        writeln!(f, "Grid cost:             {:.2} EUR", self.total_grid_cost)?;
        writeln!(f, "Peak hourly cost:      {:.4} EUR", self.peak_hourly_cost)?;
        writeln!(f, "Grid energy bought:    {:.2} kWh", self.total_purchased_kwh)?;
        writeln!(
            f,
            "Hours with purchase:   {} ({:.1}% self-sufficient)",
            self.hours_with_purchase,
            self.self_sufficient_share * 100.0
        )?;
        write!(f, "Energy transferred:    {:.2} kWh", self.total_transferred_kwh)
    }
}
