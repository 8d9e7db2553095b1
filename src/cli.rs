//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Baseline policy driving the episodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Never transfers energy.
    Idle,
    /// Uniformly random transfers.
    Random,
    /// Sends surplus to buildings in deficit.
    Sharing,
}

#[derive(Debug, Parser)]
#[command(name = "microgrid-sim")]
#[command(author, version, about = "Residential microgrid energy-sharing simulator")]
#[command(
    long_about = "Runs episodes of a neighbourhood microgrid in which buildings with \
    solar and wind generation and a battery trade energy with each other before buying \
    from the grid.\n\
    \nIf neither --scenario nor --preset is given, the community preset is used.\n\
    \nExamples:\n  \
    microgrid-sim --preset trio --policy sharing\n  \
    microgrid-sim --scenario grid.toml --episodes 3 --telemetry-out steps.csv"
)]
pub struct Cli {
    /// Load the scenario from a TOML file
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in preset (community, trio, minimal)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Override the scenario seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Policy choosing the transfers
    #[arg(long, value_enum, default_value_t = PolicyArg::Sharing)]
    pub policy: PolicyArg,

    /// Number of episodes to run
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub episodes: u32,

    /// Stop each episode after this many hours
    #[arg(long, value_name = "HOURS")]
    pub max_steps: Option<usize>,

    /// Largest amount the random policy sends per pair (kWh)
    #[arg(long, default_value_t = 2.0)]
    pub random_max_kwh: f64,

    /// Export per-step records to CSV
    #[arg(long, value_name = "PATH")]
    pub telemetry_out: Option<PathBuf>,

    /// Print only the episode reports
    #[arg(long, short)]
    pub quiet: bool,

    /// Watch the episode in a live terminal monitor
    #[cfg(feature = "tui")]
    #[arg(long)]
    pub tui: bool,

    /// Pause between ticks while the monitor is attached (ms)
    #[cfg(feature = "tui")]
    #[arg(long, default_value_t = 100)]
    pub step_delay_ms: u64,
}

impl Cli {
    /// Preset to load when no scenario file is given.
    pub fn preset_name(&self) -> &str {
        self.preset.as_deref().unwrap_or("community")
    }
}
