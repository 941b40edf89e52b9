//! Randomized presence simulation for the entrance and slot sensors.

use rand::Rng;
use serde_json::{Value, json};

pub const ENTRANCE_DETECTION_CHANCE: f64 = 0.2;
pub const SLOT_FLIP_CHANCE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct EntranceSensor {
    detection_chance: f64,
    car_detected: bool,
    last_plate: Option<String>,
}

impl Default for EntranceSensor {
    fn default() -> Self {
        Self::with_chance(ENTRANCE_DETECTION_CHANCE)
    }
}

impl EntranceSensor {
    pub fn with_chance(detection_chance: f64) -> Self {
        Self {
            detection_chance: detection_chance.clamp(0.0, 1.0),
            car_detected: false,
            last_plate: None,
        }
    }

    pub fn car_detected(&self) -> bool {
        self.car_detected
    }

    /// Plate of the most recent detected vehicle.
    pub fn last_plate(&self) -> Option<&str> {
        self.last_plate.as_deref()
    }

    pub(crate) fn sample(&mut self, rng: &mut impl Rng) -> f64 {
        self.car_detected = rng.random_bool(self.detection_chance);

        if self.car_detected {
            self.last_plate = Some(format!("ABC-{}", rng.random_range(100..999)));
            1.0
        } else {
            0.0
        }
    }

    pub(crate) fn details(&self) -> Value {
        json!({ "car_detected": self.car_detected, "last_plate": self.last_plate })
    }
}

#[derive(Debug, Clone)]
pub struct SlotSensor {
    flip_chance: f64,
    occupied: bool,
}

impl Default for SlotSensor {
    fn default() -> Self {
        Self::with_chance(SLOT_FLIP_CHANCE)
    }
}

impl SlotSensor {
    pub fn with_chance(flip_chance: f64) -> Self {
        Self {
            flip_chance: flip_chance.clamp(0.0, 1.0),
            occupied: false,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub(crate) fn sample(&mut self, rng: &mut impl Rng) -> f64 {
        if rng.random_bool(self.flip_chance) {
            self.occupied = !self.occupied;
        }

        if self.occupied { 1.0 } else { 0.0 }
    }

    pub(crate) fn details(&self) -> Value {
        json!({ "is_occupied": self.occupied })
    }
}
