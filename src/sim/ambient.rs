//! Weather, calendar and grid price model shared by all buildings.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, warn};

use crate::config::AmbientConfig;
use crate::devices::types::{AmbientReading, GridSupply};
use crate::sim::solar::{self, SolarHour};
use crate::sim::weather::{self, CsvWeather, SyntheticWeather, WeatherError, WeatherSource};

/// Converts km/h to m/s.
const KMH_TO_MS: f64 = 5.0 / 18.0;

/// Ambient state of the simulated year.
///
/// Advances one hour per [`AmbientModel::step`]. Owns the precomputed
/// irradiance series and the weather year it was derived from; the grid
/// price is resampled every hour around `price_base`.
pub struct AmbientModel {
    config: AmbientConfig,
    /// Ticks per episode; the series is built with one extra day of slack.
    horizon: usize,
    weather: Box<dyn WeatherSource>,
    rng: StdRng,

    hour: usize,
    year_offset: u32,
    year: i32,
    actual_price: f64,
    irradiance: f64,
    wind_speed: f64,
    night: bool,
    hourly_grid_purchase_cost: f64,
    hourly_purchase_count: usize,

    solar_series: Vec<SolarHour>,
    wind_series_kmh: Vec<Option<f64>>,
}

impl std::fmt::Debug for AmbientModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmbientModel")
            .field("weather", &self.weather.name())
            .field("hour", &self.hour)
            .field("year", &self.year)
            .field("actual_price", &self.actual_price)
            .field("irradiance", &self.irradiance)
            .field("wind_speed", &self.wind_speed)
            .field("night", &self.night)
            .finish_non_exhaustive()
    }
}

impl AmbientModel {
    /// Creates the ambient and loads the first weather year.
    ///
    /// # Arguments
    ///
    /// * `config` - Price, location and weather parameters
    /// * `horizon` - Episode length in hours
    /// * `weather` - Supplier of hourly weather years
    /// * `seed` - Seed for price, year and missing-wind sampling
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Exhausted`] if no weather year could be loaded.
    pub fn new(
        config: AmbientConfig,
        horizon: usize,
        weather: Box<dyn WeatherSource>,
        seed: u64,
    ) -> Result<Self, WeatherError> {
        if config.price_fluctuation_pct * 0.01 > config.price_base {
            warn!(
                price_base = config.price_base,
                price_fluctuation_pct = config.price_fluctuation_pct,
                "price fluctuation exceeds base price; negative prices are possible"
            );
        }

        let mut ambient = Self {
            actual_price: config.price_base,
            year: config.base_year,
            config,
            horizon,
            weather,
            rng: StdRng::seed_from_u64(seed),
            hour: 0,
            year_offset: 0,
            irradiance: 0.0,
            wind_speed: 0.0,
            night: false,
            hourly_grid_purchase_cost: 0.0,
            hourly_purchase_count: 0,
            solar_series: Vec::new(),
            wind_series_kmh: Vec::new(),
        };
        ambient.reset()?;
        Ok(ambient)
    }

    /// Builds the weather source named by the configuration: the CSV file
    /// when one is set, otherwise a synthetic generator seeded with `seed`.
    pub fn weather_from_config(config: &AmbientConfig, seed: u64) -> Box<dyn WeatherSource> {
        match &config.weather_csv {
            Some(path) => Box::new(CsvWeather::new(path.clone())),
            None => Box::new(SyntheticWeather::new(seed)),
        }
    }

    /// Reseeds the internal random generator.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Starts a new episode: hour 0, base price, a freshly drawn weather
    /// year and its irradiance series.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Exhausted`] if the weather year cannot be loaded.
    pub fn reset(&mut self) -> Result<(), WeatherError> {
        self.year_offset = self.rng.random_range(0..=self.config.max_year_offset);
        self.year = self.config.base_year - self.year_offset as i32;

        let weather_year =
            weather::fetch_with_retry(self.weather.as_mut(), self.year, self.config.fetch_attempts)?;
        let series_len = self.horizon.saturating_add(24);
        self.solar_series = solar::hourly_series(
            self.config.latitude,
            self.config.longitude,
            &weather_year,
            series_len,
        );
        self.wind_series_kmh = weather_year
            .records
            .iter()
            .map(|r| r.wind_speed_kmh)
            .collect();

        self.hour = 0;
        self.actual_price = self.config.price_base;
        self.hourly_grid_purchase_cost = 0.0;
        self.hourly_purchase_count = 0;
        self.load_hour();

        debug!(
            year = self.year,
            year_offset = self.year_offset,
            weather = self.weather.name(),
            weather_hours = self.wind_series_kmh.len(),
            series_hours = self.solar_series.len(),
            "ambient reset"
        );
        Ok(())
    }

    /// Advances one hour: clears the purchase ledger, resamples the price
    /// and loads the weather of the new hour.
    pub fn step(&mut self) {
        self.hour += 1;
        self.hourly_grid_purchase_cost = 0.0;
        self.hourly_purchase_count = 0;

        let sign = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        self.actual_price = self.config.price_base
            + sign * self.config.price_fluctuation_pct * 0.01 * self.rng.random::<f64>();

        self.load_hour();
    }

    fn load_hour(&mut self) {
        let solar_hour = self.solar_series.get(self.hour).copied().unwrap_or(SolarHour {
            irradiance_w_m2: 0.0,
            night: true,
        });
        self.irradiance = (solar_hour.irradiance_w_m2 / 1000.0).clamp(0.0, 1.0);
        self.night = solar_hour.night;

        let wind_kmh = match self.wind_series_kmh.get(self.hour) {
            Some(Some(kmh)) => kmh.max(0.0),
            Some(None) => self.rng.random::<f64>(),
            None => 0.0,
        };
        self.wind_speed = wind_kmh * KMH_TO_MS;
    }

    /// `[wind_speed, irradiance, night_flag]`.
    pub fn get_state(&self) -> [f64; 3] {
        self.reading().to_observation()
    }

    /// Grid price for the current hour (EUR/kWh).
    pub fn actual_price(&self) -> f64 {
        self.actual_price
    }

    pub fn hour(&self) -> usize {
        self.hour
    }

    /// Irradiance in kW/m², within [0, 1].
    pub fn irradiance(&self) -> f64 {
        self.irradiance
    }

    /// Wind speed in m/s.
    pub fn wind_speed(&self) -> f64 {
        self.wind_speed
    }

    pub fn is_night(&self) -> bool {
        self.night
    }

    /// Euros spent on grid energy during the current hour.
    pub fn hourly_grid_purchase_cost(&self) -> f64 {
        self.hourly_grid_purchase_cost
    }

    /// Purchase events recorded during the current hour, including zero purchases.
    pub fn hourly_purchase_count(&self) -> usize {
        self.hourly_purchase_count
    }

    pub fn year_offset(&self) -> u32 {
        self.year_offset
    }

    /// Calendar year the weather was taken from.
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn config(&self) -> &AmbientConfig {
        &self.config
    }
}

impl GridSupply for AmbientModel {
    fn reading(&self) -> AmbientReading {
        AmbientReading {
            wind_speed: self.wind_speed,
            irradiance: self.irradiance,
            night: self.night,
        }
    }

    /// Buys energy at the current price; negative amounts count as zero.
    fn buy_energy(&mut self, energy_kwh: f64) -> f64 {
        let price = self.actual_price * energy_kwh.max(0.0);
        self.hourly_grid_purchase_cost += price;
        self.hourly_purchase_count += 1;
        price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::weather::RecordedWeather;

    fn ambient(weather: RecordedWeather, horizon: usize) -> AmbientModel {
        let config = AmbientConfig {
            price_fluctuation_pct: 5.0,
            ..AmbientConfig::default()
        };
        AmbientModel::new(config, horizon, Box::new(weather), 11).unwrap()
    }

    #[test]
    fn reset_starts_at_hour_zero_with_base_price() {
        let a = ambient(RecordedWeather::constant(100, Some(18.0), Some(1)), 48);
        assert_eq!(a.hour(), 0);
        assert_eq!(a.actual_price(), 0.3262);
        assert_eq!(a.hourly_grid_purchase_cost(), 0.0);
        assert!(a.year_offset() <= 19);
        assert_eq!(a.year(), 2022 - a.year_offset() as i32);
    }

    #[test]
    fn wind_is_converted_to_metres_per_second() {
        let a = ambient(RecordedWeather::constant(100, Some(18.0), Some(1)), 48);
        assert!((a.wind_speed() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn missing_wind_falls_back_to_small_random_value() {
        let mut a = ambient(RecordedWeather::constant(100, None, None), 48);
        for _ in 0..20 {
            assert!(a.wind_speed() >= 0.0 && a.wind_speed() < KMH_TO_MS);
            a.step();
        }
    }

    #[test]
    fn wind_reads_zero_past_the_weather_series() {
        let mut a = ambient(RecordedWeather::constant(2, Some(36.0), Some(1)), 10);
        a.step();
        assert!(a.wind_speed() > 0.0);
        a.step();
        assert_eq!(a.wind_speed(), 0.0);
    }

    #[test]
    fn price_stays_within_fluctuation_band() {
        let mut a = ambient(RecordedWeather::constant(400, Some(10.0), Some(1)), 300);
        for _ in 0..300 {
            a.step();
            let deviation = (a.actual_price() - 0.3262).abs();
            assert!(deviation <= 0.05 + 1e-12, "deviation {deviation}");
        }
    }

    #[test]
    fn step_clears_purchase_ledger() {
        let mut a = ambient(RecordedWeather::constant(100, Some(10.0), Some(1)), 48);
        let price = a.actual_price();
        assert!((a.buy_energy(2.0) - 2.0 * price).abs() < 1e-12);
        assert_eq!(a.buy_energy(0.0), 0.0);
        assert_eq!(a.hourly_purchase_count(), 2);
        assert!((a.hourly_grid_purchase_cost() - 2.0 * price).abs() < 1e-12);

        a.step();
        assert_eq!(a.hour(), 1);
        assert_eq!(a.hourly_grid_purchase_cost(), 0.0);
        assert_eq!(a.hourly_purchase_count(), 0);
    }

    #[test]
    fn irradiance_is_bounded_and_dark_at_night() {
        let mut a = ambient(RecordedWeather::constant(200, Some(10.0), Some(1)), 72);
        for _ in 0..72 {
            assert!((0.0..=1.0).contains(&a.irradiance()));
            if a.is_night() {
                assert_eq!(a.irradiance(), 0.0);
            }
            a.step();
        }
    }

    #[test]
    fn reseed_makes_reset_reproducible() {
        let mut a = ambient(RecordedWeather::constant(100, None, Some(1)), 48);
        a.reseed(5);
        a.reset().unwrap();
        let first = (a.year(), a.get_state());
        a.step();
        a.reseed(5);
        a.reset().unwrap();
        assert_eq!((a.year(), a.get_state()), first);
    }

    #[test]
    fn failing_weather_is_fatal() {
        let result = AmbientModel::new(
            AmbientConfig {
                fetch_attempts: 3,
                ..AmbientConfig::default()
            },
            24,
            Box::new(RecordedWeather::default()),
            1,
        );
        assert!(matches!(
            result,
            Err(WeatherError::Exhausted { attempts: 3, .. })
        ));
    }
}
