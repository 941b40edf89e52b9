use serde_json::{Value, json};

use super::CommandOutcome;

pub const DEFAULT_SPEED: f64 = 1200.0;
pub const MAX_SPEED: f64 = 3000.0;

#[derive(Debug, Clone, Default)]
pub struct VentilationFan {
    speed: f64,
}

impl VentilationFan {
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_running(&self) -> bool {
        self.speed > 0.0
    }

    pub(crate) fn control(&mut self, command: &str, value: Option<f64>) -> CommandOutcome {
        match command {
            "start" => self.set(DEFAULT_SPEED),
            "stop" => self.set(0.0),
            "setspeed" => match value {
                Some(speed) if (0.0..=MAX_SPEED).contains(&speed) => self.set(speed),
                _ => CommandOutcome::Rejected,
            },
            _ => CommandOutcome::Rejected,
        }
    }

    pub(crate) fn details(&self) -> Value {
        json!({ "speed": self.speed, "is_running": self.is_running() })
    }

    fn set(&mut self, speed: f64) -> CommandOutcome {
        self.speed = speed;
        CommandOutcome::Actuated(speed)
    }
}
