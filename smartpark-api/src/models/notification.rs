use serde::{Deserialize, Serialize};

use super::{AlertNotice, StatusChange, TelemetryUpdate};

/// Everything the notification hub fans out, in one serializable envelope.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Telemetry(TelemetryUpdate),
    StatusChange(StatusChange),
    Alert(AlertNotice),
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Telemetry(_) => "telemetry",
            Notification::StatusChange(_) => "status_change",
            Notification::Alert(_) => "alert",
        }
    }
}
