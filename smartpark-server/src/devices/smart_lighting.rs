use serde_json::{Value, json};

use super::CommandOutcome;

/// Dimmable lighting circuit. Readings are ambient lux, control sets the
/// brightness level without touching the reading.
#[derive(Debug, Clone, Default)]
pub struct SmartLighting {
    brightness: f64,
}

impl SmartLighting {
    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    pub fn is_on(&self) -> bool {
        self.brightness > 0.0
    }

    pub(crate) fn control(&mut self, command: &str, value: Option<f64>) -> CommandOutcome {
        match command {
            "on" => self.brightness = 100.0,
            "off" => self.brightness = 0.0,
            "dim" => match value {
                Some(level) if (0.0..=100.0).contains(&level) => self.brightness = level,
                _ => return CommandOutcome::Rejected,
            },
            _ => return CommandOutcome::Rejected,
        }

        CommandOutcome::Accepted
    }

    pub(crate) fn details(&self) -> Value {
        json!({ "brightness": self.brightness, "is_on": self.is_on() })
    }
}
