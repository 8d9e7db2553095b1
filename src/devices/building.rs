use serde::Deserialize;

use crate::devices::battery::Battery;
use crate::devices::source::EnergySource;
use crate::devices::types::{AmbientReading, GridSupply, TransferRequest};

/// Hours in the average simulated year, used to spread annual consumption.
pub const HOURS_PER_YEAR: f64 = 365.25 * 24.0;

/// How `available_energy` is normalized at the end of [`Building::step`].
///
/// Both conventions count each hour's production exactly once and reset
/// `available_energy` to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Carryover {
    /// Production of tick `h` becomes the transfer budget of tick `h + 1`.
    #[default]
    Deferred,
    /// Production is settled within the tick; nothing is left to offer.
    Cleared,
}

/// Per-tick energy bookkeeping of one building (all values in kWh or euros).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickLedger {
    /// Energy generated by the building's own sources.
    pub produced_kwh: f64,
    /// Energy consumed by the inhabitants.
    pub consumed_kwh: f64,
    /// Deficit covered from the battery.
    pub from_battery_kwh: f64,
    /// Surplus offered to the battery (before the capacity clamp).
    pub banked_kwh: f64,
    /// Deficit bought from the grid.
    pub purchased_kwh: f64,
    /// Price paid for `purchased_kwh`.
    pub purchase_cost: f64,
}

/// A building of the microgrid community.
///
/// Owns its energy sources and battery. Per tick, `available_energy` cycles
/// through: reset → decreased by outgoing transfers → increased by incoming
/// transfers → settled in [`Building::step`]. Only the battery carries energy
/// across ticks (plus the deferred production budget under
/// [`Carryover::Deferred`]).
#[derive(Debug, Clone)]
pub struct Building {
    sources: Vec<EnergySource>,
    battery: Battery,
    inhabitants: u32,
    consumption_kwh: f64,
    carryover: Carryover,
    available_energy: f64,
    last_tick: TickLedger,
}

impl Building {
    /// Creates a building.
    ///
    /// # Arguments
    ///
    /// * `sources` - On-site generators
    /// * `battery` - The building's battery (exclusively owned)
    /// * `inhabitants` - Number of inhabitants (> 0 for a valid scenario)
    /// * `consumption_kwh` - Fixed consumption per hourly tick
    /// * `carryover` - Normalization convention for `available_energy`
    pub fn new(
        sources: Vec<EnergySource>,
        battery: Battery,
        inhabitants: u32,
        consumption_kwh: f64,
        carryover: Carryover,
    ) -> Self {
        Self {
            sources,
            battery,
            inhabitants,
            consumption_kwh: consumption_kwh.max(0.0),
            carryover,
            available_energy: 0.0,
            last_tick: TickLedger::default(),
        }
    }

    /// Gives up energy for an outgoing transfer.
    ///
    /// `Amount` requests release `min(requested, available)`; `Share` requests
    /// release the addressed fraction of what is currently available.
    /// Out-of-range inputs are clamped, so `available_energy` never drops
    /// below zero.
    ///
    /// # Returns
    ///
    /// The energy released in kWh.
    pub fn relinquish(&mut self, request: TransferRequest) -> f64 {
        let asked = match request {
            TransferRequest::Amount(kwh) => kwh.max(0.0),
            TransferRequest::Share(level) => {
                TransferRequest::share_fraction(level) * self.available_energy
            }
        };
        let released = asked.min(self.available_energy);
        self.available_energy = (self.available_energy - released).max(0.0);
        released
    }

    /// Credits an incoming transfer. Capping happens later via the battery.
    pub fn receive(&mut self, energy_kwh: f64) {
        self.available_energy += energy_kwh.max(0.0);
    }

    /// Settles one tick: production, consumption, battery, then grid purchase.
    ///
    /// The grid is the last resort; a purchase (possibly of zero energy) is
    /// reported to `supply` every tick.
    pub fn step(&mut self, supply: &mut impl GridSupply) {
        let reading = supply.reading();
        let produced = self.production(&reading);
        let budget = match self.carryover {
            Carryover::Deferred => self.available_energy,
            Carryover::Cleared => self.available_energy + produced,
        };
        let balance = budget - self.consumption_kwh;

        let mut ledger = TickLedger {
            produced_kwh: produced,
            consumed_kwh: self.consumption_kwh,
            ..TickLedger::default()
        };

        if balance < 0.0 {
            let deficit = -balance;
            ledger.from_battery_kwh = self.battery.draw(deficit);
            ledger.purchased_kwh = (deficit - ledger.from_battery_kwh).max(0.0);
            ledger.purchase_cost = supply.buy_energy(ledger.purchased_kwh);
        } else {
            self.battery.charge(balance);
            ledger.banked_kwh = balance;
            ledger.purchase_cost = supply.buy_energy(0.0);
        }

        self.available_energy = match self.carryover {
            Carryover::Deferred => produced,
            Carryover::Cleared => 0.0,
        };
        self.last_tick = ledger;
    }

    /// Total production of all sources for the given reading (kWh).
    pub fn production(&self, reading: &AmbientReading) -> f64 {
        self.sources.iter().map(|s| s.produced_power(reading)).sum()
    }

    /// Returns the building to its initial state: empty battery, nothing available.
    pub fn reset(&mut self) {
        self.battery.reset();
        self.available_energy = 0.0;
        self.last_tick = TickLedger::default();
    }

    /// Observation triple `[produced_last_tick, consumption, battery_stored]`.
    pub fn observation(&self) -> [f64; 3] {
        [
            self.last_tick.produced_kwh,
            self.consumption_kwh,
            self.battery.stored_kwh(),
        ]
    }

    /// Energy currently on offer for outgoing transfers.
    pub fn available_energy(&self) -> f64 {
        self.available_energy
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn sources(&self) -> &[EnergySource] {
        &self.sources
    }

    pub fn inhabitants(&self) -> u32 {
        self.inhabitants
    }

    /// Fixed consumption per tick in kWh.
    pub fn consumption_kwh(&self) -> f64 {
        self.consumption_kwh
    }

    /// Bookkeeping of the most recent [`Building::step`].
    pub fn last_tick(&self) -> &TickLedger {
        &self.last_tick
    }
}
