//! Hourly weather inputs for the ambient model.
//!
//! A [`WeatherSource`] delivers one calendar year of hourly wind speed and
//! sky-condition codes. Wind is reported in km/h and conditions follow the
//! meteostat `coco` code table (1 = clear ... 27 = storm).

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Hours in a leap year; the longest year a source can return.
pub const MAX_HOURS_PER_YEAR: usize = 366 * 24;

/// Errors raised while obtaining a weather year.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("weather file {path}, row {row}: invalid timestamp '{value}'")]
    BadTimestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },
    #[error("no weather records for year {year}")]
    NoData { year: i32 },
    #[error("weather source unavailable: {0}")]
    Unavailable(String),
    #[error("weather fetch failed after {attempts} attempt(s)")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<WeatherError>,
    },
}

/// One hour of observed weather.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeatherRecord {
    /// Mean wind speed in km/h; `None` when the station reported nothing.
    pub wind_speed_kmh: Option<f64>,
    /// Sky condition code; `None` when unknown.
    pub condition: Option<u8>,
}

/// Hourly weather of one calendar year, indexed by hour since Jan 1 00:00.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherYear {
    pub year: i32,
    pub records: Vec<WeatherRecord>,
}

impl WeatherYear {
    /// Returns the record for `hour`, or `None` beyond the end of the series.
    pub fn get(&self, hour: usize) -> Option<&WeatherRecord> {
        self.records.get(hour)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Supplier of hourly weather years.
///
/// `Send` so a fully built environment can move onto a simulation thread.
pub trait WeatherSource: Send {
    /// Fetches all hourly records of `year`.
    fn fetch(&mut self, year: i32) -> Result<WeatherYear, WeatherError>;

    /// Short human-readable name used in logs.
    fn name(&self) -> &str;
}

/// Fetches `year` from `source`, retrying up to `attempts` times.
///
/// # Errors
///
/// Returns [`WeatherError::Exhausted`] wrapping the last failure when every
/// attempt failed. At least one attempt is always made.
pub fn fetch_with_retry(
    source: &mut dyn WeatherSource,
    year: i32,
    attempts: u32,
) -> Result<WeatherYear, WeatherError> {
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match source.fetch(year) {
            Ok(weather) => {
                debug!(
                    source = source.name(),
                    year,
                    hours = weather.len(),
                    attempt,
                    "weather year loaded"
                );
                return Ok(weather);
            }
            Err(err) => {
                warn!(
                    source = source.name(),
                    year,
                    attempt,
                    remaining = attempts - attempt,
                    error = %err,
                    "weather fetch failed"
                );
                last_error = Some(err);
            }
        }
    }

    Err(WeatherError::Exhausted {
        attempts,
        source: Box::new(last_error.unwrap_or(WeatherError::NoData { year })),
    })
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: String,
    wspd: Option<f64>,
    coco: Option<f64>,
}

/// Reads hourly weather from a meteostat-style CSV export.
///
/// Required header columns: `time` (`YYYY-MM-DD HH:MM:SS`), `wspd` (km/h)
/// and `coco`. Other columns are ignored and empty cells read as missing.
/// Rows are placed by timestamp, so gaps in the file become missing hours.
#[derive(Debug, Clone)]
pub struct CsvWeather {
    path: PathBuf,
}

impl CsvWeather {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WeatherSource for CsvWeather {
    fn fetch(&mut self, year: i32) -> Result<WeatherYear, WeatherError> {
        let csv_error = |source| WeatherError::Csv {
            path: self.path.clone(),
            source,
        };
        let mut reader = csv::Reader::from_path(&self.path).map_err(csv_error)?;

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(csv_error)?;
            let stamp = NaiveDateTime::parse_from_str(row.time.trim(), "%Y-%m-%d %H:%M:%S")
                .map_err(|_| WeatherError::BadTimestamp {
                    path: self.path.clone(),
                    row: index + 1,
                    value: row.time.clone(),
                })?;
            if stamp.year() != year {
                continue;
            }

            let hour = (stamp.ordinal0() as usize) * 24 + stamp.hour() as usize;
            if hour >= records.len() {
                records.resize(hour + 1, WeatherRecord::default());
            }
            records[hour] = WeatherRecord {
                wind_speed_kmh: row.wspd.filter(|w| w.is_finite()),
                condition: row
                    .coco
                    .filter(|c| c.is_finite() && *c >= 0.0)
                    .map(|c| c.round().min(f64::from(u8::MAX)) as u8),
            };
        }

        if records.is_empty() {
            return Err(WeatherError::NoData { year });
        }
        Ok(WeatherYear { year, records })
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Zero-mean Gaussian noise via the Box-Muller transform.
///
/// # Returns
///
/// 0.0 for a non-positive `std_dev`.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Offline weather generator.
///
/// Wind follows an AR(1) process around a seasonal mean (windier in winter);
/// cloudiness follows a slower AR(1) process mapped onto condition codes.
/// The same seed and year always produce the same series.
#[derive(Debug, Clone)]
pub struct SyntheticWeather {
    seed: u64,
    /// Probability that an hour reports no wind measurement.
    missing_wind_probability: f64,
}

impl SyntheticWeather {
    const WIND_MEAN_KMH: f64 = 13.0;
    const WIND_SEASONAL_KMH: f64 = 4.0;
    const WIND_PERSISTENCE: f64 = 0.9;
    const WIND_NOISE_KMH: f64 = 2.5;
    const CLOUD_PERSISTENCE: f64 = 0.95;
    const CLOUD_NOISE: f64 = 0.12;

    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            missing_wind_probability: 0.01,
        }
    }

    /// Overrides the share of hours without a wind measurement (clamped to [0, 1]).
    pub fn with_missing_wind_probability(mut self, probability: f64) -> Self {
        self.missing_wind_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn condition_code(cloudiness: f64) -> u8 {
        match cloudiness {
            c if c < -0.3 => 1,
            c if c < 0.2 => 3,
            c if c < 0.6 => 5,
            c if c < 0.9 => 7,
            _ => 17,
        }
    }
}

impl WeatherSource for SyntheticWeather {
    fn fetch(&mut self, year: i32) -> Result<WeatherYear, WeatherError> {
        let mut rng = StdRng::seed_from_u64(self.seed ^ (year as u64).rotate_left(32));
        let hours = if chrono::NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
            MAX_HOURS_PER_YEAR
        } else {
            365 * 24
        };

        let mut wind_anomaly = 0.0;
        let mut cloudiness = 0.0;
        let mut records = Vec::with_capacity(hours);
        for hour in 0..hours {
            let day = (hour / 24) as f64;
            let seasonal = Self::WIND_MEAN_KMH
                + Self::WIND_SEASONAL_KMH * (2.0 * std::f64::consts::PI * (day - 15.0) / 365.0).cos();
            wind_anomaly = Self::WIND_PERSISTENCE * wind_anomaly
                + gaussian_noise(&mut rng, Self::WIND_NOISE_KMH);
            cloudiness = (Self::CLOUD_PERSISTENCE * cloudiness
                + gaussian_noise(&mut rng, Self::CLOUD_NOISE))
            .clamp(-1.5, 1.5);

            let wind_speed_kmh = if rng.random_bool(self.missing_wind_probability) {
                None
            } else {
                Some((seasonal + wind_anomaly).max(0.0))
            };
            records.push(WeatherRecord {
                wind_speed_kmh,
                condition: Some(Self::condition_code(cloudiness)),
            });
        }

        Ok(WeatherYear { year, records })
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Replays the same hourly records for every requested year.
#[derive(Debug, Clone, Default)]
pub struct RecordedWeather {
    records: Vec<WeatherRecord>,
}

impl RecordedWeather {
    pub fn new(records: Vec<WeatherRecord>) -> Self {
        Self { records }
    }

    /// `hours` identical records.
    pub fn constant(hours: usize, wind_speed_kmh: Option<f64>, condition: Option<u8>) -> Self {
        Self::new(vec![
            WeatherRecord {
                wind_speed_kmh,
                condition,
            };
            hours
        ])
    }
}

impl WeatherSource for RecordedWeather {
    fn fetch(&mut self, year: i32) -> Result<WeatherYear, WeatherError> {
        if self.records.is_empty() {
            return Err(WeatherError::NoData { year });
        }
        Ok(WeatherYear {
            year,
            records: self.records.clone(),
        })
    }

    fn name(&self) -> &str {
        "recorded"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct Flaky {
        failures_left: u32,
        calls: u32,
    }

    impl WeatherSource for Flaky {
        fn fetch(&mut self, year: i32) -> Result<WeatherYear, WeatherError> {
            self.calls += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(WeatherError::Unavailable("timeout".into()));
            }
            RecordedWeather::constant(24, Some(10.0), Some(1)).fetch(year)
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[test]
    fn gaussian_noise_zero_std_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
        assert_eq!(gaussian_noise(&mut rng, -1.0), 0.0);
    }

    #[test]
    fn retry_recovers_after_transient_failures() {
        let mut source = Flaky {
            failures_left: 2,
            calls: 0,
        };
        let weather = fetch_with_retry(&mut source, 2020, 5).unwrap();
        assert_eq!(weather.len(), 24);
        assert_eq!(source.calls, 3);
    }

    #[test]
    fn retry_gives_up_after_bound() {
        let mut source = Flaky {
            failures_left: 100,
            calls: 0,
        };
        let err = fetch_with_retry(&mut source, 2020, 4).unwrap_err();
        assert!(matches!(err, WeatherError::Exhausted { attempts: 4, .. }));
        assert_eq!(source.calls, 4);
    }

    #[test]
    fn retry_makes_at_least_one_attempt() {
        let mut source = Flaky {
            failures_left: 0,
            calls: 0,
        };
        assert!(fetch_with_retry(&mut source, 2020, 0).is_ok());
        assert_eq!(source.calls, 1);
    }

    #[test]
    fn synthetic_is_deterministic_per_seed_and_year() {
        let a = SyntheticWeather::new(7).fetch(2019).unwrap();
        let b = SyntheticWeather::new(7).fetch(2019).unwrap();
        let c = SyntheticWeather::new(7).fetch(2018).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 365 * 24);
        assert_eq!(SyntheticWeather::new(7).fetch(2020).unwrap().len(), 366 * 24);
    }

    #[test]
    fn synthetic_wind_is_non_negative() {
        let weather = SyntheticWeather::new(3)
            .with_missing_wind_probability(0.0)
            .fetch(2021)
            .unwrap();
        assert!(
            weather
                .records
                .iter()
                .all(|r| r.wind_speed_kmh.is_some_and(|w| w >= 0.0))
        );
    }

    #[test]
    fn csv_rows_are_placed_by_timestamp() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("microgrid_weather_{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "time,temp,wspd,coco").unwrap();
        writeln!(file, "2019-12-31 23:00:00,1.0,5.0,2").unwrap();
        writeln!(file, "2020-01-01 00:00:00,1.0,18.0,3").unwrap();
        writeln!(file, "2020-01-01 02:00:00,1.5,,17").unwrap();
        drop(file);

        let weather = CsvWeather::new(&path).fetch(2020).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(weather.len(), 3);
        assert_eq!(weather.records[0].wind_speed_kmh, Some(18.0));
        assert_eq!(weather.records[0].condition, Some(3));
        // Gap hour is missing entirely
        assert_eq!(weather.records[1], WeatherRecord::default());
        assert_eq!(weather.records[2].wind_speed_kmh, None);
        assert_eq!(weather.records[2].condition, Some(17));
    }

    #[test]
    fn csv_missing_file_names_path() {
        let err = CsvWeather::new("/nonexistent/weather.csv")
            .fetch(2020)
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/weather.csv"));
    }

    #[test]
    fn empty_recorded_weather_has_no_data() {
        let err = RecordedWeather::default().fetch(2001).unwrap_err();
        assert!(matches!(err, WeatherError::NoData { year: 2001 }));
    }
}
