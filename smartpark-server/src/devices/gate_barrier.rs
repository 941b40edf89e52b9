use serde_json::{Value, json};

use super::CommandOutcome;

/// Entry barrier arm. Position is a percentage, 0 closed and 100 open.
#[derive(Debug, Clone, Default)]
pub struct GateBarrier {
    position: f64,
}

impl GateBarrier {
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_open(&self) -> bool {
        self.position >= 90.0
    }

    pub(crate) fn control(&mut self, command: &str, value: Option<f64>) -> CommandOutcome {
        match command {
            "open" => self.set(100.0),
            "close" => self.set(0.0),
            "setposition" => match value {
                Some(position) if (0.0..=100.0).contains(&position) => self.set(position),
                _ => CommandOutcome::Rejected,
            },
            _ => CommandOutcome::Rejected,
        }
    }

    pub(crate) fn details(&self) -> Value {
        json!({ "position": self.position, "is_open": self.is_open() })
    }

    fn set(&mut self, position: f64) -> CommandOutcome {
        self.position = position;
        CommandOutcome::Actuated(position)
    }
}
