use std::env;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use smartpark_api::models::{DeviceRecord, DeviceStatus, DeviceType};
use time::OffsetDateTime;

use crate::configs::normalize_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub url: String,
    #[serde(default)]
    pub clean_start: bool,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    /// Directory telemetry source paths are resolved against
    pub root: PathBuf,
    /// Seconds between polling ticks
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Seconds to wait after a failed tick
    #[serde(default = "default_error_backoff")]
    pub error_backoff: u64,
}

impl Telemetry {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alerting {
    /// Minimum seconds between two alerts for the same device
    #[serde(default = "default_cooldown")]
    pub cooldown: u64,
}

impl Alerting {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automation {
    /// Initial value of the auto mode flag
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_automation_interval")]
    pub interval: u64,
    #[serde(default = "default_night_start")]
    pub night_start: u8,
    #[serde(default = "default_night_end")]
    pub night_end: u8,
}

impl Automation {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Night wraps midnight: `hour >= night_start || hour < night_end`.
    pub fn is_night(&self, hour: u8) -> bool {
        hour >= self.night_start || hour < self.night_end
    }
}

/// Device registered on boot when no record with the same tag exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSeed {
    pub tag: String,
    pub name: String,
    pub device_type: DeviceType,
    #[serde(default)]
    pub location: String,
    pub warning_threshold: Option<f64>,
    pub critical_threshold: Option<f64>,
    pub unit: Option<String>,
    pub telemetry_source: Option<String>,
}

impl DeviceSeed {
    pub fn to_record(&self) -> DeviceRecord {
        DeviceRecord {
            id: 0,
            tag: self.tag.clone(),
            name: self.name.clone(),
            device_type: self.device_type,
            location: self.location.clone(),
            status: DeviceStatus::Offline,
            warning_threshold: self.warning_threshold,
            critical_threshold: self.critical_threshold,
            unit: self
                .unit
                .clone()
                .unwrap_or_else(|| self.device_type.default_unit().to_string()),
            is_controllable: self.device_type.is_controllable(),
            is_active: true,
            telemetry_source: self.telemetry_source.clone(),
            created_at: OffsetDateTime::now_utc(),
            last_updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub database: Database,
    pub telemetry: Telemetry,
    pub alerting: Alerting,
    pub automation: Automation,
    #[serde(default)]
    pub devices: Vec<DeviceSeed>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let mut settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("SMARTPARK").separator("__"))
            .build()?
            .try_deserialize()?;

        let root = settings.telemetry.root.to_string_lossy().to_string();
        settings.telemetry.root = normalize_path(&root)
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: Server {
                host: String::from("127.0.0.1"),
                port: 3000,
            },
            logger: Logger {
                level: String::from("info"),
            },
            database: Database {
                url: String::from("sqlite::memory:"),
                clean_start: true,
                max_connections: 1,
            },
            telemetry: Telemetry {
                root: PathBuf::from("telemetry"),
                poll_interval: default_poll_interval(),
                error_backoff: default_error_backoff(),
            },
            alerting: Alerting {
                cooldown: default_cooldown(),
            },
            automation: Automation {
                enabled: false,
                interval: default_automation_interval(),
                night_start: default_night_start(),
                night_end: default_night_end(),
            },
            devices: Vec::new(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_poll_interval() -> u64 {
    3
}

fn default_error_backoff() -> u64 {
    5
}

fn default_cooldown() -> u64 {
    60
}

fn default_automation_interval() -> u64 {
    2
}

fn default_night_start() -> u8 {
    18
}

fn default_night_end() -> u8 {
    6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_night_window_wraps_midnight() {
        let automation = Settings::default().automation;

        assert!(automation.is_night(18));
        assert!(automation.is_night(23));
        assert!(automation.is_night(0));
        assert!(automation.is_night(5));
        assert!(!automation.is_night(6));
        assert!(!automation.is_night(17));
    }

    #[test]
    fn test_seed_fills_type_defaults() {
        let seed = DeviceSeed {
            tag: String::from("GATE-001"),
            name: String::from("Main Gate"),
            device_type: DeviceType::EntryGateBarrier,
            location: String::from("Entrance"),
            warning_threshold: None,
            critical_threshold: None,
            unit: None,
            telemetry_source: Some(String::from("gate.txt")),
        };

        let record = seed.to_record();
        assert_eq!(record.unit, "%");
        assert!(record.is_controllable);
        assert!(record.is_active);
        assert_eq!(record.status, DeviceStatus::Offline);
    }

    #[test]
    fn test_default_intervals() {
        let settings = Settings::default();

        assert_eq!(settings.telemetry.poll_interval(), Duration::from_secs(3));
        assert_eq!(settings.telemetry.error_backoff(), Duration::from_secs(5));
        assert_eq!(settings.alerting.cooldown(), Duration::from_secs(60));
        assert_eq!(settings.automation.interval(), Duration::from_secs(2));
    }
}
