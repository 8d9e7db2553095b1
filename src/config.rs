//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::devices::building::{Building, Carryover, HOURS_PER_YEAR};
use crate::devices::{Battery, EnergySource, SourceKind};
use crate::sim::reward::RewardKind;
use crate::sim::types::TransferMode;

/// Top-level scenario configuration parsed from TOML.
///
/// All tables have defaults except the building list, which every scenario
/// must spell out. Load from TOML with [`ScenarioConfig::from_toml_file`] or
/// use one of the [`ScenarioConfig::PRESETS`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Episode length, action variant and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Price, location and weather parameters.
    #[serde(default)]
    pub ambient: AmbientConfig,
    /// Community members in index order.
    #[serde(default)]
    pub buildings: Vec<BuildingConfig>,
}

/// Episode length, action variant and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed.
    pub seed: u64,
    /// Simulated days; the horizon is `round(days * 24)` hours (must be > 0).
    pub days: f64,
    /// How controller actions are interpreted.
    pub transfer_mode: TransferMode,
    /// How `available_energy` is normalized after each building step.
    pub carryover: Carryover,
    /// Reward function.
    pub reward: RewardKind,
    /// Annual consumption per inhabitant (kWh) when a building has no override.
    pub per_inhabitant_kwh_per_year: f64,
    /// Capacity of the snapshot channel feeding the monitor (must be > 0).
    pub snapshot_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            days: 365.25,
            transfer_mode: TransferMode::Absolute,
            carryover: Carryover::Deferred,
            reward: RewardKind::Simple,
            per_inhabitant_kwh_per_year: 1500.0,
            snapshot_capacity: 64,
        }
    }
}

impl SimulationConfig {
    /// Longest accepted episode, ten years.
    pub const MAX_DAYS: f64 = 3652.5;

    /// Episode length in hourly ticks.
    pub fn horizon_hours(&self) -> usize {
        (self.days * 24.0).round().max(0.0) as usize
    }
}

/// Price, location and weather parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmbientConfig {
    /// Mean grid price in EUR/kWh (must be > 0).
    pub price_base: f64,
    /// Price swing per tick, in hundredths of a euro (must be >= 0).
    pub price_fluctuation_pct: f64,
    /// Site latitude in degrees.
    pub latitude: f64,
    /// Site longitude in degrees.
    pub longitude: f64,
    /// Most recent year weather may be taken from.
    pub base_year: i32,
    /// Largest number of years to look back when picking the weather year.
    pub max_year_offset: u32,
    /// Meteostat-style hourly CSV; synthetic weather when absent.
    pub weather_csv: Option<PathBuf>,
    /// Attempts before a weather fetch failure becomes fatal (must be > 0).
    pub fetch_attempts: u32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            price_base: 0.3262,
            price_fluctuation_pct: 0.5,
            latitude: 52.38259,
            longitude: 9.717735,
            base_year: 2022,
            max_year_offset: 19,
            weather_csv: None,
            fetch_attempts: 10,
        }
    }
}

/// One building of the community.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingConfig {
    /// Number of inhabitants (must be > 0).
    pub inhabitants: u32,
    /// Battery specification.
    pub battery: BatterySpec,
    /// On-site generators; may be empty.
    #[serde(default)]
    pub energy_sources: Vec<SourceSpec>,
    /// Fixed annual consumption (kWh), overriding the per-inhabitant rate.
    #[serde(default)]
    pub consumption_kwh_per_year: Option<f64>,
}

/// Battery specification of a building.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatterySpec {
    /// Capacity in kWh (must be >= 0).
    pub capacity: f64,
}

/// One generator of a building.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSpec {
    /// `"solar"` or `"wind"`.
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Peak power (must be >= 0).
    pub peak_power: f64,
}

impl BuildingConfig {
    fn new(inhabitants: u32, capacity: f64, sources: &[(SourceKind, f64)]) -> Self {
        Self {
            inhabitants,
            battery: BatterySpec { capacity },
            energy_sources: sources
                .iter()
                .map(|&(kind, peak_power)| SourceSpec { kind, peak_power })
                .collect(),
            consumption_kwh_per_year: None,
        }
    }

    /// Annual consumption in kWh.
    pub fn annual_consumption_kwh(&self, per_inhabitant_kwh_per_year: f64) -> f64 {
        self.consumption_kwh_per_year
            .unwrap_or(f64::from(self.inhabitants) * per_inhabitant_kwh_per_year)
    }

    /// Instantiates a fresh building (empty battery, nothing available).
    pub fn build(&self, simulation: &SimulationConfig) -> Building {
        let sources = self
            .energy_sources
            .iter()
            .map(|s| EnergySource::new(s.kind, s.peak_power))
            .collect();
        Building::new(
            sources,
            Battery::new(self.battery.capacity),
            self.inhabitants,
            self.annual_consumption_kwh(simulation.per_inhabitant_kwh_per_year) / HOURS_PER_YEAR,
            simulation.carryover,
        )
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"buildings[1].inhabitants"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Four buildings with mixed solar and wind, absolute transfers and the
    /// mean/max relative reward.
    pub fn community() -> Self {
        use SourceKind::{Solar, Wind};
        Self {
            simulation: SimulationConfig {
                reward: RewardKind::Relative,
                ..SimulationConfig::default()
            },
            ambient: AmbientConfig::default(),
            buildings: vec![
                BuildingConfig::new(5, 27.76, &[(Solar, 11.1)]),
                BuildingConfig::new(2, 9.25, &[(Solar, 5.55)]),
                BuildingConfig::new(1, 1.85, &[(Solar, 2.78)]),
                BuildingConfig::new(1, 1.85, &[(Wind, 2.7)]),
            ],
        }
    }

    /// One well-equipped building, one small producer and one pure consumer,
    /// with the simple reward.
    pub fn trio() -> Self {
        use SourceKind::Solar;
        Self {
            simulation: SimulationConfig::default(),
            ambient: AmbientConfig::default(),
            buildings: vec![
                BuildingConfig::new(5, 27.76, &[(Solar, 11.1)]),
                BuildingConfig::new(2, 0.0, &[(Solar, 0.93)]),
                BuildingConfig::new(1, 0.0, &[]),
            ],
        }
    }

    /// A producer and a consumer without storage, trading discrete shares
    /// under the normalized reward.
    pub fn minimal() -> Self {
        let mut producer = BuildingConfig::new(3, 0.0, &[(SourceKind::Solar, 1.0)]);
        producer.consumption_kwh_per_year = Some(4919.0);
        let mut consumer = BuildingConfig::new(3, 0.0, &[]);
        consumer.consumption_kwh_per_year = Some(4919.0);
        Self {
            simulation: SimulationConfig {
                transfer_mode: TransferMode::Share,
                reward: RewardKind::Normalized,
                ..SimulationConfig::default()
            },
            ambient: AmbientConfig::default(),
            buildings: vec![producer, consumer],
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["community", "trio", "minimal"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "community" => Ok(Self::community()),
            "trio" => Ok(Self::trio()),
            "minimal" => Ok(Self::minimal()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid, names an unknown
    /// source type, or lacks a required building key.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Number of buildings.
    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Instantiates all buildings in index order.
    pub fn build_buildings(&self) -> Vec<Building> {
        self.buildings
            .iter()
            .map(|b| b.build(&self.simulation))
            .collect()
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if !(s.days.is_finite() && s.days > 0.0) || s.horizon_hours() == 0 {
            errors.push(ConfigError::new(
                "simulation.days",
                "must be > 0 and span at least one hour",
            ));
        } else if s.days > SimulationConfig::MAX_DAYS {
            errors.push(ConfigError::new(
                "simulation.days",
                format!("must be <= {}", SimulationConfig::MAX_DAYS),
            ));
        }
        if !(s.per_inhabitant_kwh_per_year.is_finite() && s.per_inhabitant_kwh_per_year >= 0.0) {
            errors.push(ConfigError::new(
                "simulation.per_inhabitant_kwh_per_year",
                "must be >= 0",
            ));
        }
        if s.snapshot_capacity == 0 {
            errors.push(ConfigError::new("simulation.snapshot_capacity", "must be > 0"));
        }

        let a = &self.ambient;
        if !(a.price_base.is_finite() && a.price_base > 0.0) {
            errors.push(ConfigError::new("ambient.price_base", "must be > 0"));
        }
        if !(a.price_fluctuation_pct.is_finite() && a.price_fluctuation_pct >= 0.0) {
            errors.push(ConfigError::new("ambient.price_fluctuation_pct", "must be >= 0"));
        }
        if !(-90.0..=90.0).contains(&a.latitude) {
            errors.push(ConfigError::new("ambient.latitude", "must be in [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&a.longitude) {
            errors.push(ConfigError::new("ambient.longitude", "must be in [-180, 180]"));
        }
        if a.fetch_attempts == 0 {
            errors.push(ConfigError::new("ambient.fetch_attempts", "must be > 0"));
        }
        if i64::from(a.base_year) - i64::from(a.max_year_offset) < 1 {
            errors.push(ConfigError::new(
                "ambient.max_year_offset",
                "must not reach before year 1",
            ));
        }

        if self.buildings.is_empty() {
            errors.push(ConfigError::new("buildings", "at least one building is required"));
        }
        for (i, b) in self.buildings.iter().enumerate() {
            if b.inhabitants == 0 {
                errors.push(ConfigError::new(
                    format!("buildings[{i}].inhabitants"),
                    "must be > 0",
                ));
            }
            if !(b.battery.capacity.is_finite() && b.battery.capacity >= 0.0) {
                errors.push(ConfigError::new(
                    format!("buildings[{i}].battery.capacity"),
                    "must be >= 0",
                ));
            }
            if b
                .consumption_kwh_per_year
                .is_some_and(|kwh| !(kwh.is_finite() && kwh >= 0.0))
            {
                errors.push(ConfigError::new(
                    format!("buildings[{i}].consumption_kwh_per_year"),
                    "must be >= 0",
                ));
            }
            for (j, source) in b.energy_sources.iter().enumerate() {
                if !(source.peak_power.is_finite() && source.peak_power >= 0.0) {
                    errors.push(ConfigError::new(
                        format!("buildings[{i}].energy_sources[{j}].peak_power"),
                        "must be >= 0",
                    ));
                }
            }
        }

        errors
    }
}
