use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Id, TelemetryReading, Thresholds};

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Ambient temperature probe
    TemperatureSensor,
    /// Relative humidity probe
    HumiditySensor,
    /// Entry gate barrier arm
    EntryGateBarrier,
    /// Dimmable lighting circuit
    SmartLighting,
    /// Exhaust ventilation fan
    VentilationFan,
    /// Lane vehicle counter
    TrafficCounter,
    /// Main power meter
    PowerMeter,
    /// Entrance vehicle presence sensor
    EntranceSensor,
    /// Per-slot occupancy sensor
    SlotSensor,
}

impl DeviceType {
    pub const ALL: [DeviceType; 9] = [
        DeviceType::TemperatureSensor,
        DeviceType::HumiditySensor,
        DeviceType::EntryGateBarrier,
        DeviceType::SmartLighting,
        DeviceType::VentilationFan,
        DeviceType::TrafficCounter,
        DeviceType::PowerMeter,
        DeviceType::EntranceSensor,
        DeviceType::SlotSensor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::TemperatureSensor => "temperature_sensor",
            DeviceType::HumiditySensor => "humidity_sensor",
            DeviceType::EntryGateBarrier => "entry_gate_barrier",
            DeviceType::SmartLighting => "smart_lighting",
            DeviceType::VentilationFan => "ventilation_fan",
            DeviceType::TrafficCounter => "traffic_counter",
            DeviceType::PowerMeter => "power_meter",
            DeviceType::EntranceSensor => "entrance_sensor",
            DeviceType::SlotSensor => "slot_sensor",
        }
    }

    /// Unit reported by the variant when the record does not override it.
    pub fn default_unit(&self) -> &'static str {
        match self {
            DeviceType::TemperatureSensor => "°F",
            DeviceType::HumiditySensor => "%",
            DeviceType::EntryGateBarrier => "%",
            DeviceType::SmartLighting => "Lux",
            DeviceType::VentilationFan => "RPM",
            DeviceType::TrafficCounter => "Cars/Min",
            DeviceType::PowerMeter => "kW",
            DeviceType::EntranceSensor | DeviceType::SlotSensor => "Bool",
        }
    }

    pub fn is_controllable(&self) -> bool {
        matches!(
            self,
            DeviceType::EntryGateBarrier
                | DeviceType::SmartLighting
                | DeviceType::VentilationFan
                | DeviceType::TrafficCounter
                | DeviceType::PowerMeter
        )
    }

    /// Whether readings come from a telemetry source file rather than
    /// randomized presence simulation.
    pub fn requires_source(&self) -> bool {
        !matches!(self, DeviceType::EntranceSensor | DeviceType::SlotSensor)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDeviceType(pub String);

impl fmt::Display for UnknownDeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown device type: {}", self.0)
    }
}

impl std::error::Error for UnknownDeviceType {}

impl FromStr for DeviceType {
    type Err = UnknownDeviceType;

    /// Accepts `snake_case`, `kebab-case` and `PascalCase` tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        DeviceType::ALL
            .into_iter()
            .find(|t| t.as_str().replace('_', "") == normalized)
            .ok_or_else(|| UnknownDeviceType(s.to_string()))
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceStatus {
    /// Not yet polled or disconnected
    #[default]
    Offline,
    /// Below every configured threshold
    Normal,
    /// At or above the warning threshold
    Warning,
    /// At or above the critical threshold
    Critical,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Offline => "Offline",
            DeviceStatus::Normal => "Normal",
            DeviceStatus::Warning => "Warning",
            DeviceStatus::Critical => "Critical",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "offline" => Ok(DeviceStatus::Offline),
            "normal" => Ok(DeviceStatus::Normal),
            "warning" => Ok(DeviceStatus::Warning),
            "critical" => Ok(DeviceStatus::Critical),
            _ => Err(format!("unknown device status: {s}")),
        }
    }
}

/// Persisted description of a device as the registry and repository see it.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device identifier
    pub id: Id,
    /// External tag, e.g. `GATE-001`
    pub tag: String,
    /// Display name
    pub name: String,
    /// Device variant
    pub device_type: DeviceType,
    /// Free-form location label
    pub location: String,
    /// Last persisted status
    pub status: DeviceStatus,
    /// Warning threshold
    pub warning_threshold: Option<f64>,
    /// Critical threshold
    pub critical_threshold: Option<f64>,
    /// Reading unit
    pub unit: String,
    /// Accepts control commands
    pub is_controllable: bool,
    /// Included in polling
    pub is_active: bool,
    /// Telemetry source path, relative to the telemetry root
    pub telemetry_source: Option<String>,
    /// Creation time
    pub created_at: OffsetDateTime,
    /// Last telemetry or control update
    pub last_updated_at: Option<OffsetDateTime>,
}

impl DeviceRecord {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.warning_threshold, self.critical_threshold)
    }
}

/// Dashboard view of a device: persisted record plus live instance state.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Persisted record
    #[serde(flatten)]
    pub record: DeviceRecord,
    /// Last value read or set, if the device has been materialized
    pub current_value: Option<f64>,
    /// Time of the last in-memory update
    pub last_update: Option<OffsetDateTime>,
    /// Variant specific state (position, brightness, totals, ...)
    pub details: Option<serde_json::Value>,
    /// Newest persisted reading, survives restarts unlike `current_value`
    pub latest_reading: Option<TelemetryReading>,
}
