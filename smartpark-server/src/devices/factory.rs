use std::path::PathBuf;
use std::time::Duration;

use smartpark_api::models::{DeviceRecord, DeviceType};

use super::{Device, EntranceSensor, SlotSensor, Variant};
use crate::configs::Telemetry;

/// Builds device instances for a type tag and resolves their telemetry
/// source against the configured root.
#[derive(Debug, Clone)]
pub struct DeviceFactory {
    root: PathBuf,
    poll_interval: Duration,
    entrance_chance: Option<f64>,
    slot_chance: Option<f64>,
}

impl DeviceFactory {
    pub fn new(telemetry: &Telemetry) -> Self {
        Self {
            root: telemetry.root.clone(),
            poll_interval: telemetry.poll_interval(),
            entrance_chance: None,
            slot_chance: None,
        }
    }

    /// Overrides the presence simulation odds, mostly for deterministic tests.
    pub fn with_presence_chances(mut self, entrance: f64, slot: f64) -> Self {
        self.entrance_chance = Some(entrance);
        self.slot_chance = Some(slot);
        self
    }

    pub fn variant(&self, device_type: DeviceType) -> Variant {
        match device_type {
            DeviceType::EntranceSensor => match self.entrance_chance {
                Some(chance) => Variant::EntranceSensor(EntranceSensor::with_chance(chance)),
                None => Variant::for_type(device_type),
            },
            DeviceType::SlotSensor => match self.slot_chance {
                Some(chance) => Variant::SlotSensor(SlotSensor::with_chance(chance)),
                None => Variant::for_type(device_type),
            },
            _ => Variant::for_type(device_type),
        }
    }

    pub fn create(&self, record: &DeviceRecord) -> Device {
        let device = Device::new(record, self.variant(record.device_type), self.poll_interval);

        match self.source_path(record) {
            Some(path) => device.with_source(path),
            None => device,
        }
    }

    pub fn source_path(&self, record: &DeviceRecord) -> Option<PathBuf> {
        record
            .telemetry_source
            .as_deref()
            .map(|source| self.root.join(source))
    }
}
