use serde::Deserialize;

use crate::devices::types::AmbientReading;

/// Kind of generator as named in scenario files (`"solar"` or `"wind"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Solar,
    Wind,
}

/// A stateless on-site generator.
///
/// Production is a pure function of the ambient reading and the peak power,
/// so calling [`EnergySource::produced_power`] repeatedly within a tick always
/// yields the same value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnergySource {
    /// Photovoltaic array; `peak_power` in kWp per kW/m² of irradiance.
    Solar { peak_power: f64 },
    /// Wind turbine; `peak_power` in kW per m/s of wind speed.
    Wind { peak_power: f64 },
}

impl EnergySource {
    /// Creates a source of the given kind. Negative peak power is clamped to zero.
    pub fn new(kind: SourceKind, peak_power: f64) -> Self {
        let peak_power = peak_power.max(0.0);
        match kind {
            SourceKind::Solar => Self::Solar { peak_power },
            SourceKind::Wind => Self::Wind { peak_power },
        }
    }

    /// Shorthand for a solar source.
    pub fn solar(peak_power: f64) -> Self {
        Self::new(SourceKind::Solar, peak_power)
    }

    /// Shorthand for a wind source.
    pub fn wind(peak_power: f64) -> Self {
        Self::new(SourceKind::Wind, peak_power)
    }

    /// Returns the generator kind.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Solar { .. } => SourceKind::Solar,
            Self::Wind { .. } => SourceKind::Wind,
        }
    }

    /// Returns the configured peak power.
    pub fn peak_power(&self) -> f64 {
        match *self {
            Self::Solar { peak_power } | Self::Wind { peak_power } => peak_power,
        }
    }

    /// Energy produced during one hourly tick (kWh, >= 0).
    ///
    /// Solar scales with irradiance (kW/m²), wind with wind speed (m/s).
    pub fn produced_power(&self, reading: &AmbientReading) -> f64 {
        let factor = match self {
            Self::Solar { .. } => reading.irradiance,
            Self::Wind { .. } => reading.wind_speed,
        };
        (factor * self.peak_power()).max(0.0)
    }
}
