use serde::{Deserialize, Serialize};

use super::{AlertSeverity, DeviceStatus};

/// Maps a reading onto a status. Critical is checked before warning and both
/// boundaries are inclusive.
pub fn evaluate(value: f64, warning: Option<f64>, critical: Option<f64>) -> DeviceStatus {
    if warning.is_none() && critical.is_none() {
        return DeviceStatus::Normal;
    }

    match (warning, critical) {
        (_, Some(critical)) if value >= critical => DeviceStatus::Critical,
        (Some(warning), _) if value >= warning => DeviceStatus::Warning,
        _ => DeviceStatus::Normal,
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Warning level, inclusive
    pub warning: Option<f64>,
    /// Critical level, inclusive
    pub critical: Option<f64>,
}

impl Thresholds {
    pub const fn new(warning: Option<f64>, critical: Option<f64>) -> Self {
        Self { warning, critical }
    }

    pub fn is_configured(&self) -> bool {
        self.warning.is_some() || self.critical.is_some()
    }

    pub fn status(&self, value: f64) -> DeviceStatus {
        evaluate(value, self.warning, self.critical)
    }

    /// Same ordering as [`Thresholds::status`], falling back to `Info` below
    /// every threshold.
    pub fn severity(&self, value: f64) -> AlertSeverity {
        match self.status(value) {
            DeviceStatus::Critical => AlertSeverity::Critical,
            DeviceStatus::Warning => AlertSeverity::Warning,
            DeviceStatus::Normal | DeviceStatus::Offline => AlertSeverity::Info,
        }
    }

    /// True once the value reaches the lower of the configured thresholds.
    pub fn is_alertable(&self, value: f64) -> bool {
        let lowest = match (self.warning, self.critical) {
            (Some(warning), Some(critical)) => warning.min(critical),
            (Some(threshold), None) | (None, Some(threshold)) => threshold,
            (None, None) => return false,
        };

        value >= lowest
    }
}
