/// A building's energy store with a hard capacity clamp.
///
/// `Battery` is deliberately lossless and power-unlimited: within one hourly
/// tick it can deliver everything it holds and accept anything up to its
/// remaining headroom. Energy offered beyond capacity is discarded.
///
/// # Invariant
/// `0.0 <= stored_kwh <= capacity_kwh` after every mutator.
#[derive(Debug, Clone, PartialEq)]
pub struct Battery {
    /// Total energy capacity in kilowatt-hours.
    capacity_kwh: f64,

    /// Energy currently held in kilowatt-hours.
    stored_kwh: f64,
}

impl Battery {
    /// Creates an empty battery.
    ///
    /// Negative or non-finite capacities are clamped to zero, which yields a
    /// battery that can never hold energy.
    pub fn new(capacity_kwh: f64) -> Self {
        let capacity_kwh = if capacity_kwh.is_finite() {
            capacity_kwh.max(0.0)
        } else {
            0.0
        };
        Self {
            capacity_kwh,
            stored_kwh: 0.0,
        }
    }

    /// Returns the capacity in kWh.
    pub fn capacity_kwh(&self) -> f64 {
        self.capacity_kwh
    }

    /// Returns the stored energy in kWh.
    pub fn stored_kwh(&self) -> f64 {
        self.stored_kwh
    }

    /// Returns the fill level as a fraction of capacity (0.0 for a zero-capacity battery).
    pub fn fill_fraction(&self) -> f64 {
        if self.capacity_kwh > 0.0 {
            self.stored_kwh / self.capacity_kwh
        } else {
            0.0
        }
    }

    /// Draws up to `requested_kwh` from the battery.
    ///
    /// # Returns
    ///
    /// The energy actually delivered: `min(requested, stored)`, never negative.
    pub fn draw(&mut self, requested_kwh: f64) -> f64 {
        let requested = requested_kwh.max(0.0);
        let delivered = requested.min(self.stored_kwh);
        self.stored_kwh = (self.stored_kwh - delivered).max(0.0);
        delivered
    }

    /// Charges the battery with `offered_kwh`; anything above capacity is lost.
    pub fn charge(&mut self, offered_kwh: f64) {
        let offered = offered_kwh.max(0.0);
        self.stored_kwh = (self.stored_kwh + offered).min(self.capacity_kwh);
    }

    /// Empties the battery.
    pub fn reset(&mut self) {
        self.stored_kwh = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_battery_is_empty() {
        let battery = Battery::new(10.0);
        assert_eq!(battery.capacity_kwh(), 10.0);
        assert_eq!(battery.stored_kwh(), 0.0);
        assert_eq!(battery.fill_fraction(), 0.0);
    }

    #[test]
    fn test_negative_capacity_clamped_to_zero() {
        let battery = Battery::new(-3.0);
        assert_eq!(battery.capacity_kwh(), 0.0);
    }

    #[test]
    fn test_charge_discards_excess() {
        let mut battery = Battery::new(10.0);
        battery.charge(15.0);
        assert_eq!(battery.stored_kwh(), 10.0);
    }

    #[test]
    fn test_draw_sequence() {
        let mut battery = Battery::new(10.0);
        battery.charge(15.0);

        assert_eq!(battery.draw(4.0), 4.0);
        assert_eq!(battery.stored_kwh(), 6.0);

        // Only what is stored can be delivered
        assert_eq!(battery.draw(10.0), 6.0);
        assert_eq!(battery.stored_kwh(), 0.0);
    }

    #[test]
    fn test_negative_requests_are_no_ops() {
        let mut battery = Battery::new(5.0);
        battery.charge(2.0);
        assert_eq!(battery.draw(-1.0), 0.0);
        battery.charge(-1.0);
        assert_eq!(battery.stored_kwh(), 2.0);
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let mut battery = Battery::new(0.0);
        battery.charge(3.0);
        assert_eq!(battery.stored_kwh(), 0.0);
        assert_eq!(battery.draw(1.0), 0.0);
    }

    #[test]
    fn test_stored_stays_within_bounds() {
        let mut battery = Battery::new(7.5);
        let moves = [3.0, -2.0, 9.0, 4.5, 0.25, 12.0, 1.0, 8.0];
        for (i, amount) in moves.iter().enumerate() {
            if i % 2 == 0 {
                battery.charge(*amount);
            } else {
                battery.draw(*amount);
            }
            assert!(battery.stored_kwh() >= 0.0);
            assert!(battery.stored_kwh() <= battery.capacity_kwh());
        }
    }

    #[test]
    fn test_reset_empties() {
        let mut battery = Battery::new(4.0);
        battery.charge(3.0);
        battery.reset();
        assert_eq!(battery.stored_kwh(), 0.0);
        assert_eq!(battery.capacity_kwh(), 4.0);
    }
}
