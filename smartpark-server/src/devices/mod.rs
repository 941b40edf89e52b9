//! Live device instances. A [`Device`] carries the state shared by every
//! variant and dispatches variant behaviour through the closed [`Variant`]
//! set.

mod factory;
mod gate_barrier;
mod power_meter;
mod presence;
pub mod reader;
mod registry;
mod smart_lighting;
mod traffic_counter;
mod ventilation_fan;

pub use factory::DeviceFactory;
pub use gate_barrier::GateBarrier;
pub use power_meter::PowerMeter;
pub use presence::{ENTRANCE_DETECTION_CHANCE, EntranceSensor, SLOT_FLIP_CHANCE, SlotSensor};
pub use registry::{DeviceRegistry, SharedDevice};
pub use smart_lighting::SmartLighting;
pub use traffic_counter::TrafficCounter;
pub use ventilation_fan::VentilationFan;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use smartpark_api::models::{DeviceRecord, DeviceStatus, DeviceType, Id, Thresholds};
use time::OffsetDateTime;

use crate::errors::DeviceError;

/// Result of a variant interpreting a control command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CommandOutcome {
    /// Unknown command or out of range value
    Rejected,
    /// Internal state changed, the reading stays as it was
    Accepted,
    /// The actuator now reports this value
    Actuated(f64),
}

#[derive(Debug, Clone)]
pub enum Variant {
    /// File-backed sensor without actuation (temperature, humidity)
    Passive,
    GateBarrier(GateBarrier),
    SmartLighting(SmartLighting),
    VentilationFan(VentilationFan),
    PowerMeter(PowerMeter),
    TrafficCounter(TrafficCounter),
    EntranceSensor(EntranceSensor),
    SlotSensor(SlotSensor),
}

impl Variant {
    pub fn for_type(device_type: DeviceType) -> Self {
        match device_type {
            DeviceType::TemperatureSensor | DeviceType::HumiditySensor => Variant::Passive,
            DeviceType::EntryGateBarrier => Variant::GateBarrier(GateBarrier::default()),
            DeviceType::SmartLighting => Variant::SmartLighting(SmartLighting::default()),
            DeviceType::VentilationFan => Variant::VentilationFan(VentilationFan::default()),
            DeviceType::PowerMeter => Variant::PowerMeter(PowerMeter::default()),
            DeviceType::TrafficCounter => Variant::TrafficCounter(TrafficCounter::default()),
            DeviceType::EntranceSensor => Variant::EntranceSensor(EntranceSensor::default()),
            DeviceType::SlotSensor => Variant::SlotSensor(SlotSensor::default()),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Variant::Passive => None,
            Variant::GateBarrier(gate) => Some(gate.details()),
            Variant::SmartLighting(light) => Some(light.details()),
            Variant::VentilationFan(fan) => Some(fan.details()),
            Variant::PowerMeter(meter) => Some(meter.details()),
            Variant::TrafficCounter(counter) => Some(counter.details()),
            Variant::EntranceSensor(sensor) => Some(sensor.details()),
            Variant::SlotSensor(sensor) => Some(sensor.details()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Device {
    id: Id,
    tag: String,
    name: String,
    device_type: DeviceType,
    unit: String,
    thresholds: Thresholds,
    is_controllable: bool,
    status: DeviceStatus,
    current_value: f64,
    last_update: Option<OffsetDateTime>,
    source: Option<PathBuf>,
    cursor: usize,
    poll_interval: Duration,
    variant: Variant,
}

impl Device {
    pub fn new(record: &DeviceRecord, variant: Variant, poll_interval: Duration) -> Self {
        let unit = if record.unit.is_empty() {
            record.device_type.default_unit().to_string()
        } else {
            record.unit.clone()
        };

        Self {
            id: record.id,
            tag: record.tag.clone(),
            name: record.name.clone(),
            device_type: record.device_type,
            unit,
            thresholds: record.thresholds(),
            is_controllable: record.is_controllable,
            status: DeviceStatus::Offline,
            current_value: 0.0,
            last_update: None,
            source: None,
            cursor: 0,
            poll_interval,
            variant,
        }
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Picks up threshold and naming edits made to the persisted record.
    /// A device that has reported is re-evaluated against the new thresholds.
    pub fn refresh(&mut self, record: &DeviceRecord) {
        self.name.clone_from(&record.name);
        self.is_controllable = record.is_controllable;
        self.thresholds = record.thresholds();

        if self.last_update.is_some() {
            self.status = self.thresholds.status(self.current_value);
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn is_controllable(&self) -> bool {
        self.is_controllable
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    pub fn last_update(&self) -> Option<OffsetDateTime> {
        self.last_update
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    /// Whether the lighting circuit is lit. `None` for other variants.
    pub fn is_light_on(&self) -> Option<bool> {
        match &self.variant {
            Variant::SmartLighting(light) => Some(light.is_on()),
            _ => None,
        }
    }

    /// Slot occupancy. `None` for other variants.
    pub fn is_occupied(&self) -> Option<bool> {
        match &self.variant {
            Variant::SlotSensor(sensor) => Some(sensor.is_occupied()),
            _ => None,
        }
    }

    /// Variant specific state for dashboard snapshots.
    pub fn details(&self) -> Option<Value> {
        self.variant.details()
    }

    /// Acquires the next reading and re-derives the status from it.
    pub async fn read_telemetry(&mut self) -> Result<f64, DeviceError> {
        let value = match self.sample_presence() {
            Some(value) => value,
            None if self.is_idle_meter() => 0.0,
            None => {
                let value = self.read_source().await?;
                let interval = self.poll_interval.as_secs_f64();

                match &mut self.variant {
                    Variant::PowerMeter(meter) => meter.record(value, interval),
                    Variant::TrafficCounter(counter) => counter.record(value, interval),
                    _ => {}
                }

                value
            },
        };

        self.apply_reading(value);

        Ok(value)
    }

    /// Interprets a control command. Unknown commands and out of range values
    /// yield `Ok(false)`; only a non-controllable device is an error.
    pub fn control(&mut self, command: &str, value: Option<&Value>) -> Result<bool, DeviceError> {
        if !self.is_controllable {
            return Err(DeviceError::NotControllable(self.tag.clone()));
        }

        let command = command.trim().to_ascii_lowercase();
        let value = value.and_then(numeric);

        let outcome = match &mut self.variant {
            Variant::GateBarrier(gate) => gate.control(&command, value),
            Variant::SmartLighting(light) => light.control(&command, value),
            Variant::VentilationFan(fan) => fan.control(&command, value),
            Variant::PowerMeter(meter) => meter.control(&command),
            Variant::TrafficCounter(counter) => counter.control(&command),
            _ => CommandOutcome::Rejected,
        };

        match outcome {
            CommandOutcome::Rejected => Ok(false),
            CommandOutcome::Accepted => {
                self.last_update = Some(OffsetDateTime::now_utc());
                Ok(true)
            },
            CommandOutcome::Actuated(value) => {
                self.apply_reading(value);
                Ok(true)
            },
        }
    }

    fn sample_presence(&mut self) -> Option<f64> {
        let mut rng = rand::rng();

        match &mut self.variant {
            Variant::EntranceSensor(sensor) => Some(sensor.sample(&mut rng)),
            Variant::SlotSensor(sensor) => Some(sensor.sample(&mut rng)),
            _ => None,
        }
    }

    fn is_idle_meter(&self) -> bool {
        matches!(&self.variant, Variant::PowerMeter(meter) if !meter.is_monitoring())
    }

    async fn read_source(&mut self) -> Result<f64, DeviceError> {
        let source = self.source.as_deref().ok_or(DeviceError::TelemetrySourceUnset)?;

        let (value, cursor) = reader::read_next(source, self.cursor).await?;
        self.cursor = cursor;

        Ok(value)
    }

    fn apply_reading(&mut self, value: f64) {
        self.current_value = value;
        self.status = self.thresholds.status(value);
        self.last_update = Some(OffsetDateTime::now_utc());
    }
}

/// Accepts JSON numbers and numeric strings.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::tests::sample_record;

    fn device(device_type: DeviceType) -> Device {
        let mut record = sample_record("DEV-001", device_type);
        record.id = 1;
        Device::new(&record, Variant::for_type(device_type), Duration::from_secs(3))
    }

    fn source(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn gate(device: &Device) -> &GateBarrier {
        match device.variant() {
            Variant::GateBarrier(gate) => gate,
            other => panic!("not a gate: {other:?}"),
        }
    }

    #[test]
    fn test_gate_barrier_open_close() {
        let mut device = device(DeviceType::EntryGateBarrier);

        assert!(device.control("open", None).unwrap());
        assert_eq!(gate(&device).position(), 100.0);
        assert!(gate(&device).is_open());
        assert_eq!(device.current_value(), 100.0);

        assert!(device.control("close", None).unwrap());
        assert_eq!(gate(&device).position(), 0.0);
        assert!(!gate(&device).is_open());
    }

    #[test]
    fn test_gate_barrier_rejects_out_of_range_position() {
        let mut device = device(DeviceType::EntryGateBarrier);
        device.control("setposition", Some(&json!(40))).unwrap();

        assert!(!device.control("setposition", Some(&json!(150))).unwrap());
        assert_eq!(gate(&device).position(), 40.0);

        assert!(!device.control("setposition", None).unwrap());
        assert!(!device.control("wiggle", None).unwrap());
        assert_eq!(gate(&device).position(), 40.0);

        assert!(!device.control("  ", None).unwrap());
    }

    #[test]
    fn test_commands_ignore_case_and_accept_numeric_strings() {
        let mut device = device(DeviceType::EntryGateBarrier);

        assert!(device.control("SetPosition", Some(&json!("95"))).unwrap());
        assert!(gate(&device).is_open());
        assert!(device.control("CLOSE", None).unwrap());
        assert!(!gate(&device).is_open());
    }

    #[test]
    fn test_passive_sensor_is_not_controllable() {
        let mut device = device(DeviceType::TemperatureSensor);

        let result = device.control("open", None);
        assert!(matches!(result, Err(DeviceError::NotControllable(tag)) if tag == "DEV-001"));
    }

    #[test]
    fn test_lighting_keeps_reading_on_control() {
        let mut device = device(DeviceType::SmartLighting);
        assert_eq!(device.is_light_on(), Some(false));

        assert!(device.control("on", None).unwrap());
        assert_eq!(device.is_light_on(), Some(true));
        assert_eq!(device.current_value(), 0.0);

        assert!(device.control("dim", Some(&json!(0))).unwrap());
        assert_eq!(device.is_light_on(), Some(false));
        assert!(!device.control("dim", Some(&json!(101))).unwrap());
    }

    #[test]
    fn test_fan_speed_commands() {
        let mut device = device(DeviceType::VentilationFan);

        assert!(device.control("start", None).unwrap());
        assert_eq!(device.current_value(), 1200.0);
        assert!(device.control("setspeed", Some(&json!(3000))).unwrap());
        assert!(!device.control("setspeed", Some(&json!(3001))).unwrap());
        assert_eq!(device.current_value(), 3000.0);
        assert!(device.control("stop", None).unwrap());
        assert_eq!(device.current_value(), 0.0);
    }

    #[test]
    fn test_control_re_evaluates_status() {
        let mut record = sample_record("FAN-001", DeviceType::VentilationFan);
        record.warning_threshold = Some(2000.0);
        record.critical_threshold = Some(2800.0);
        let mut device = Device::new(&record, Variant::for_type(record.device_type), Duration::from_secs(3));

        device.control("setspeed", Some(&json!(2500))).unwrap();
        assert_eq!(device.status(), DeviceStatus::Warning);
        device.control("setspeed", Some(&json!(2800))).unwrap();
        assert_eq!(device.status(), DeviceStatus::Critical);
    }

    #[tokio::test]
    async fn test_read_telemetry_requires_source() {
        let mut device = device(DeviceType::HumiditySensor);

        let result = device.read_telemetry().await;
        assert!(matches!(result, Err(DeviceError::TelemetrySourceUnset)));
        assert_eq!(device.status(), DeviceStatus::Offline);
    }

    #[tokio::test]
    async fn test_read_telemetry_updates_status() {
        let file = source("70\n85\n95\n");
        let mut record = sample_record("TEMP-001", DeviceType::TemperatureSensor);
        record.warning_threshold = Some(85.0);
        record.critical_threshold = Some(95.0);
        let mut device = Device::new(&record, Variant::Passive, Duration::from_secs(3)).with_source(file.path());

        let mut statuses = Vec::new();
        for _ in 0..4 {
            device.read_telemetry().await.unwrap();
            statuses.push(device.status());
        }

        assert_eq!(
            statuses,
            vec![
                DeviceStatus::Normal,
                DeviceStatus::Warning,
                DeviceStatus::Critical,
                DeviceStatus::Normal
            ]
        );
        assert_eq!(device.cursor(), 1);
        assert!(device.last_update().is_some());
    }

    #[tokio::test]
    async fn test_refresh_reevaluates_status_with_new_thresholds() {
        let file = source("90\n");
        let mut record = sample_record("TEMP-002", DeviceType::TemperatureSensor);
        record.warning_threshold = Some(85.0);
        record.critical_threshold = Some(95.0);
        let mut device = Device::new(&record, Variant::Passive, Duration::from_secs(3)).with_source(file.path());

        device.refresh(&record);
        assert_eq!(device.status(), DeviceStatus::Offline);

        device.read_telemetry().await.unwrap();
        assert_eq!(device.status(), DeviceStatus::Warning);

        record.critical_threshold = Some(88.0);
        device.refresh(&record);
        assert_eq!(device.status(), DeviceStatus::Critical);
        assert_eq!(device.current_value(), 90.0);
    }

    #[tokio::test]
    async fn test_power_meter_accumulates_while_monitoring() {
        let file = source("36\n72\n");
        let mut device = device(DeviceType::PowerMeter).with_source(file.path());

        device.read_telemetry().await.unwrap();
        device.read_telemetry().await.unwrap();
        let total = match device.variant() {
            Variant::PowerMeter(meter) => meter.total_energy(),
            _ => unreachable!(),
        };
        assert!((total - 0.09).abs() < 1e-9);

        device.control("stop", None).unwrap();
        assert_eq!(device.read_telemetry().await.unwrap(), 0.0);
        assert_eq!(device.cursor(), 2);

        device.control("reset", None).unwrap();
        match device.variant() {
            Variant::PowerMeter(meter) => assert_eq!(meter.total_energy(), 0.0),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_traffic_counter_accumulates_cars() {
        let file = source("20\n40\n");
        let mut device = device(DeviceType::TrafficCounter).with_source(file.path());

        device.read_telemetry().await.unwrap();
        device.read_telemetry().await.unwrap();
        match device.variant() {
            Variant::TrafficCounter(counter) => assert!((counter.total_cars() - 3.0).abs() < 1e-9),
            _ => unreachable!(),
        }

        assert!(device.control("calibrate", None).unwrap());
        assert!(device.control("reset", None).unwrap());
        assert!(!device.control("open", None).unwrap());
    }

    #[tokio::test]
    async fn test_presence_sensors_need_no_source() {
        let mut device = device(DeviceType::SlotSensor);

        let value = device.read_telemetry().await.unwrap();
        assert!(value == 0.0 || value == 1.0);
        assert_eq!(device.is_occupied(), Some(value == 1.0));
        assert_eq!(device.status(), DeviceStatus::Normal);
    }
}
