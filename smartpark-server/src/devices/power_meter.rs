use serde_json::{Value, json};

use super::CommandOutcome;

/// Main power meter. While monitoring, every read adds the energy drawn over
/// one poll interval.
#[derive(Debug, Clone)]
pub struct PowerMeter {
    total_energy: f64,
    monitoring: bool,
}

impl Default for PowerMeter {
    fn default() -> Self {
        Self {
            total_energy: 0.0,
            monitoring: true,
        }
    }
}

impl PowerMeter {
    /// Accumulated consumption in kWh.
    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub(crate) fn record(&mut self, kilowatts: f64, poll_interval_secs: f64) {
        self.total_energy += kilowatts * (poll_interval_secs / 3600.0);
    }

    pub(crate) fn control(&mut self, command: &str) -> CommandOutcome {
        match command {
            "reset" => self.total_energy = 0.0,
            "start" => self.monitoring = true,
            "stop" => self.monitoring = false,
            _ => return CommandOutcome::Rejected,
        }

        CommandOutcome::Accepted
    }

    pub(crate) fn details(&self) -> Value {
        json!({ "total_energy": self.total_energy, "is_monitoring": self.monitoring })
    }
}
