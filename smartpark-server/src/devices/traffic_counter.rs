use serde_json::{Value, json};

use super::CommandOutcome;

/// Lane counter reporting cars per minute.
#[derive(Debug, Clone)]
pub struct TrafficCounter {
    total_cars: f64,
    calibrated: bool,
}

impl Default for TrafficCounter {
    fn default() -> Self {
        Self {
            total_cars: 0.0,
            calibrated: true,
        }
    }
}

impl TrafficCounter {
    /// Approximate number of cars since the last reset.
    pub fn total_cars(&self) -> f64 {
        self.total_cars
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub(crate) fn record(&mut self, cars_per_minute: f64, poll_interval_secs: f64) {
        self.total_cars += (cars_per_minute / 60.0) * poll_interval_secs;
    }

    pub(crate) fn control(&mut self, command: &str) -> CommandOutcome {
        match command {
            "reset" => self.total_cars = 0.0,
            "calibrate" => self.calibrated = true,
            _ => return CommandOutcome::Rejected,
        }

        CommandOutcome::Accepted
    }

    pub(crate) fn details(&self) -> Value {
        json!({ "total_cars": self.total_cars, "is_calibrated": self.calibrated })
    }
}
