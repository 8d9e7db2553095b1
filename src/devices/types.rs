//! Common types shared by building-side components.

/// Weather reading passed to energy sources during production calculations.
///
/// Produced by [`AmbientModel::reading`](crate::sim::ambient::AmbientModel::reading)
/// once per call; copying it is cheap and keeps sources free of any
/// reference back to the ambient.
/// # Fields
/// * `wind_speed` - Wind speed in m/s (>= 0)
/// * `irradiance` - Solar irradiance in kW/m², within [0, 1]
/// * `night` - Whether the sun is below the horizon
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AmbientReading {
    pub wind_speed: f64,
    pub irradiance: f64,
    pub night: bool,
}

impl AmbientReading {
    /// Creates a daytime reading with the given wind speed and irradiance.
    pub fn new(wind_speed: f64, irradiance: f64) -> Self {
        Self {
            wind_speed,
            irradiance,
            night: false,
        }
    }

    /// Returns the reading as the `[wind, irradiance, night_flag]` observation triple.
    pub fn to_observation(self) -> [f64; 3] {
        [
            self.wind_speed,
            self.irradiance,
            if self.night { 1.0 } else { 0.0 },
        ]
    }
}

/// The environment a building settles against each tick.
///
/// Implemented by [`AmbientModel`](crate::sim::ambient::AmbientModel); the
/// building borrows it for the duration of one `step` call.
pub trait GridSupply {
    /// Returns the weather reading for the current hour.
    fn reading(&self) -> AmbientReading;

    /// Buys `energy_kwh` from the external grid at the current price.
    ///
    /// # Returns
    ///
    /// The price paid in euros.
    fn buy_energy(&mut self, energy_kwh: f64) -> f64;
}

/// Discrete transfer fractions addressed by share levels 0, 1 and 2.
pub const SHARE_FRACTIONS: [f64; 3] = [0.0, 0.5, 1.0];

/// A single request asking a building to give up energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferRequest {
    /// Absolute amount in kWh.
    Amount(f64),
    /// Share level indexing [`SHARE_FRACTIONS`] of the currently available energy.
    Share(u8),
}

impl TransferRequest {
    /// Returns the requested fraction for share requests, clamping levels above 2.
    pub fn share_fraction(level: u8) -> f64 {
        SHARE_FRACTIONS[usize::from(level).min(SHARE_FRACTIONS.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_triple_encodes_night_flag() {
        let day = AmbientReading::new(3.0, 0.4);
        assert_eq!(day.to_observation(), [3.0, 0.4, 0.0]);

        let night = AmbientReading {
            night: true,
            ..AmbientReading::default()
        };
        assert_eq!(night.to_observation(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn share_levels_clamp_to_full() {
        assert_eq!(TransferRequest::share_fraction(0), 0.0);
        assert_eq!(TransferRequest::share_fraction(1), 0.5);
        assert_eq!(TransferRequest::share_fraction(2), 1.0);
        assert_eq!(TransferRequest::share_fraction(7), 1.0);
    }
}
