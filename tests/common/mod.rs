//! Shared fixtures for integration tests.

#![allow(dead_code)]

use microgrid_sim::config::{BatterySpec, BuildingConfig, ScenarioConfig, SourceSpec};
use microgrid_sim::devices::building::HOURS_PER_YEAR;
use microgrid_sim::devices::{Carryover, SourceKind};
use microgrid_sim::sim::env::GridEnvironment;
use microgrid_sim::sim::reward::RewardKind;
use microgrid_sim::sim::types::TransferMode;
use microgrid_sim::sim::weather::{RecordedWeather, SyntheticWeather};

/// Wind speed that yields exactly 5 m/s.
pub const WIND_KMH: f64 = 18.0;

/// Annual consumption that amounts to `kwh_per_hour` every tick.
pub fn hourly(kwh_per_hour: f64) -> Option<f64> {
    Some(kwh_per_hour * HOURS_PER_YEAR)
}

/// A building with at most one wind turbine and a fixed consumption.
pub fn building(capacity: f64, wind_peak: f64, consumption_per_hour: f64) -> BuildingConfig {
    let energy_sources = if wind_peak > 0.0 {
        vec![SourceSpec {
            kind: SourceKind::Wind,
            peak_power: wind_peak,
        }]
    } else {
        Vec::new()
    };
    BuildingConfig {
        inhabitants: 1,
        battery: BatterySpec { capacity },
        energy_sources,
        consumption_kwh_per_year: hourly(consumption_per_hour),
    }
}

/// Scenario over `days` with the given buildings and settings.
pub fn scenario(
    buildings: Vec<BuildingConfig>,
    mode: TransferMode,
    carryover: Carryover,
    days: f64,
) -> ScenarioConfig {
    let mut config = ScenarioConfig::trio();
    config.simulation.days = days;
    config.simulation.transfer_mode = mode;
    config.simulation.carryover = carryover;
    config.simulation.reward = RewardKind::Simple;
    config.buildings = buildings;
    config
}

/// Producer making 5 kWh per tick with nothing to consume, next to a
/// consumer needing 1 kWh per tick without any storage.
pub fn producer_and_consumer(carryover: Carryover) -> ScenarioConfig {
    scenario(
        vec![building(10.0, 1.0, 0.0), building(0.0, 0.0, 1.0)],
        TransferMode::Absolute,
        carryover,
        2.0,
    )
}

/// Constant wind of [`WIND_KMH`] under a clear sky.
pub fn steady_wind(hours: usize) -> Box<RecordedWeather> {
    Box::new(RecordedWeather::constant(hours, Some(WIND_KMH), Some(1)))
}

/// Environment on steady wind with enough hours for the whole horizon.
pub fn steady_env(config: ScenarioConfig) -> GridEnvironment {
    let hours = config.simulation.horizon_hours() + 48;
    GridEnvironment::with_weather(config, steady_wind(hours)).unwrap()
}

/// Environment on seeded synthetic weather.
pub fn synthetic_env(config: ScenarioConfig, seed: u64) -> GridEnvironment {
    GridEnvironment::with_weather(config, Box::new(SyntheticWeather::new(seed))).unwrap()
}

/// Construction result on synthetic weather, for tests expecting errors.
pub fn synthetic_env_result(
    config: ScenarioConfig,
) -> Result<GridEnvironment, microgrid_sim::sim::types::EnvError> {
    GridEnvironment::with_weather(config, Box::new(SyntheticWeather::new(1)))
}
