//! Solar geometry and clear-sky direct radiation.
//!
//! Altitude uses the Spencer (1971) declination and equation-of-time series.
//! Direct beam radiation follows the ASHRAE model
//! `A · exp(-k / sin(altitude))` with seasonally varying `A` and `k`.

use std::f64::consts::PI;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::sim::weather::WeatherYear;

const DEG: f64 = PI / 180.0;

/// Whole-hour UTC offset approximated from longitude.
pub fn utc_offset_hours(longitude_deg: f64) -> i64 {
    (longitude_deg / 15.0).round() as i64
}

/// Solar altitude above the horizon in degrees.
///
/// # Arguments
///
/// * `latitude_deg` - Geographic latitude (-90 ... 90)
/// * `longitude_deg` - Geographic longitude (-180 ... 180)
/// * `utc` - Instant of interest in UTC
pub fn altitude_deg(latitude_deg: f64, longitude_deg: f64, utc: NaiveDateTime) -> f64 {
    let doy = f64::from(utc.ordinal());
    let ut_h = f64::from(utc.hour()) + f64::from(utc.minute()) / 60.0;

    let b = 2.0 * PI * (doy - 1.0) / 365.0;
    let decl = 0.006918 - 0.399912 * b.cos() + 0.070257 * b.sin()
        - 0.006758 * (2.0 * b).cos()
        + 0.000907 * (2.0 * b).sin()
        - 0.002697 * (3.0 * b).cos()
        + 0.00148 * (3.0 * b).sin();

    // Equation of time in minutes
    let eot_min = 229.18
        * (0.000075 + 0.001868 * b.cos()
            - 0.032077 * b.sin()
            - 0.014615 * (2.0 * b).cos()
            - 0.04089 * (2.0 * b).sin());

    // True solar time from UTC
    let solar_h = ut_h + longitude_deg / 15.0 + eot_min / 60.0;
    let omega = 15.0 * (solar_h - 12.0) * DEG;

    let lat = latitude_deg * DEG;
    let sin_alpha = lat.sin() * decl.sin() + lat.cos() * decl.cos() * omega.cos();
    sin_alpha.clamp(-1.0, 1.0).asin() / DEG
}

/// Clear-sky direct beam radiation in W/m² for the given day and altitude.
///
/// Zero when the sun is at or below the horizon.
pub fn direct_radiation_w_m2(day_of_year: u32, altitude_deg: f64) -> f64 {
    if altitude_deg <= 0.0 {
        return 0.0;
    }
    let day = f64::from(day_of_year);
    let flux = 1160.0 + 75.0 * (2.0 * PI / 365.0 * (day - 275.0)).sin();
    let optical_depth = 0.174 + 0.035 * (2.0 * PI / 365.0 * (day - 100.0)).sin();
    let air_mass_ratio = 1.0 / (altitude_deg * DEG).sin();
    (flux * (-optical_depth * air_mass_ratio).exp()).max(0.0)
}

/// Attenuation factor for a sky-condition code.
///
/// Fog, rain, snow and storms (9, 11, 13 and >= 15) halve the beam; clear
/// to partly cloudy (<= 3) passes it fully; everything else, including an
/// unknown condition, keeps 80 %.
pub fn sky_modifier(condition: Option<u8>) -> f64 {
    match condition {
        Some(code) if code >= 15 || matches!(code, 9 | 11 | 13) => 0.5,
        Some(code) if code <= 3 => 1.0,
        _ => 0.8,
    }
}

/// One precomputed hour of the solar series.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolarHour {
    /// Irradiance after sky attenuation in W/m².
    pub irradiance_w_m2: f64,
    /// Sun at or below the horizon.
    pub night: bool,
}

/// Builds an hourly irradiance series starting Jan 1 00:00 local time of
/// `weather.year`.
///
/// Hours past the end of the weather data use the "unknown sky" modifier.
/// Returns an empty series when the year is outside chrono's calendar.
pub fn hourly_series(
    latitude_deg: f64,
    longitude_deg: f64,
    weather: &WeatherYear,
    hours: usize,
) -> Vec<SolarHour> {
    let Some(local_start) = NaiveDate::from_ymd_opt(weather.year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return Vec::new();
    };
    let utc_start = local_start - Duration::hours(utc_offset_hours(longitude_deg));

    (0..hours)
        .map(|hour| {
            let utc = utc_start + Duration::hours(hour as i64);
            let altitude = altitude_deg(latitude_deg, longitude_deg, utc);
            let condition = weather.get(hour).and_then(|r| r.condition);
            SolarHour {
                irradiance_w_m2: direct_radiation_w_m2(utc.ordinal(), altitude)
                    * sky_modifier(condition),
                night: altitude <= 0.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::weather::WeatherRecord;

    const HANNOVER: (f64, f64) = (52.38259, 9.717735);

    fn utc(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn summer_noon_is_high_and_midnight_is_dark() {
        let (lat, lon) = HANNOVER;
        let noon = altitude_deg(lat, lon, utc(2021, 6, 21, 11));
        let midnight = altitude_deg(lat, lon, utc(2021, 6, 21, 23));
        // 90 - 52.4 + 23.4 ≈ 61°
        assert!((noon - 61.0).abs() < 2.0, "noon altitude {noon}");
        assert!(midnight < 0.0);
    }

    #[test]
    fn winter_noon_is_low() {
        let (lat, lon) = HANNOVER;
        let noon = altitude_deg(lat, lon, utc(2021, 12, 21, 11));
        assert!(noon > 10.0 && noon < 16.0, "noon altitude {noon}");
    }

    #[test]
    fn no_direct_radiation_below_horizon() {
        assert_eq!(direct_radiation_w_m2(172, 0.0), 0.0);
        assert_eq!(direct_radiation_w_m2(172, -12.0), 0.0);
    }

    #[test]
    fn direct_radiation_rises_with_altitude() {
        let low = direct_radiation_w_m2(172, 10.0);
        let high = direct_radiation_w_m2(172, 60.0);
        assert!(low > 0.0);
        assert!(high > low);
        assert!(high < 1160.0 + 75.0);
    }

    #[test]
    fn sky_modifier_table() {
        assert_eq!(sky_modifier(Some(1)), 1.0);
        assert_eq!(sky_modifier(Some(3)), 1.0);
        assert_eq!(sky_modifier(Some(5)), 0.8);
        assert_eq!(sky_modifier(Some(9)), 0.5);
        assert_eq!(sky_modifier(Some(10)), 0.8);
        assert_eq!(sky_modifier(Some(13)), 0.5);
        assert_eq!(sky_modifier(Some(18)), 0.5);
        assert_eq!(sky_modifier(None), 0.8);
    }

    #[test]
    fn series_follows_day_night_cycle() {
        let (lat, lon) = HANNOVER;
        let weather = WeatherYear {
            year: 2021,
            records: vec![
                WeatherRecord {
                    wind_speed_kmh: None,
                    condition: Some(1),
                };
                48
            ],
        };
        let series = hourly_series(lat, lon, &weather, 48);
        assert_eq!(series.len(), 48);
        assert!(series[0].night);
        assert_eq!(series[0].irradiance_w_m2, 0.0);
        assert!(!series[12].night);
        assert!(series[12].irradiance_w_m2 > 0.0);
        assert!(series.iter().all(|h| h.irradiance_w_m2 >= 0.0));
    }
}
