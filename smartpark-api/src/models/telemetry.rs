use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{DeviceStatus, Id};

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    /// Reading identifier, assigned on insert
    pub id: Id,
    /// Source device
    pub device_id: Id,
    /// Reading value
    pub value: f64,
    /// Acquisition time
    pub timestamp: OffsetDateTime,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryUpdate {
    pub device_id: Id,
    pub tag: String,
    pub value: f64,
    pub unit: String,
    pub status: DeviceStatus,
    pub timestamp: OffsetDateTime,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub device_id: Id,
    pub tag: String,
    pub previous: DeviceStatus,
    pub current: DeviceStatus,
    pub value: f64,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryQuery {
    /// Maximum readings returned, newest first
    pub count: Option<u32>,
}
