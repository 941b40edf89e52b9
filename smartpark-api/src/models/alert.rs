use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Id;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "Info",
            AlertSeverity::Warning => "Warning",
            AlertSeverity::Critical => "Critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(AlertSeverity::Info),
            "warning" => Ok(AlertSeverity::Warning),
            "critical" => Ok(AlertSeverity::Critical),
            _ => Err(format!("unknown alert severity: {s}")),
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert identifier, assigned on insert
    pub id: Id,
    /// Source device, absent for system wide alerts
    pub device_id: Option<Id>,
    /// Alert classification
    pub severity: AlertSeverity,
    /// Human readable message
    pub message: String,
    /// Reading that raised the alert
    pub trigger_value: f64,
    /// Creation time
    pub created_at: OffsetDateTime,
    /// Operator acknowledged
    pub acknowledged: bool,
    /// Acknowledge time
    pub acknowledged_at: Option<OffsetDateTime>,
    /// Acknowledging user
    pub acknowledged_by: Option<Id>,
}

/// Alert as broadcast to subscribers, carrying the device tag for display.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotice {
    #[serde(flatten)]
    pub alert: Alert,
    /// Device tag or `System`
    pub device_tag: String,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeAlertRequest {
    /// Acknowledging user
    pub user_id: Id,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAlertRequest {
    /// Related device, if any
    pub device_id: Option<Id>,
    /// Alert classification
    pub severity: AlertSeverity,
    /// Human readable message
    pub message: String,
}
