use smartpark_api::models::{DeviceRecord, DeviceStatus, DeviceType};
use time::OffsetDateTime;

use super::Table;
use crate::errors::RepositoryError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeviceRow {
    pub id: i32,
    pub tag: String,
    pub name: String,
    pub device_type: String,
    pub location: String,
    pub status: String,
    pub warning_threshold: Option<f64>,
    pub critical_threshold: Option<f64>,
    pub unit: String,
    pub is_controllable: bool,
    pub is_active: bool,
    pub telemetry_source: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_updated_at: Option<OffsetDateTime>,
}

impl TryFrom<DeviceRow> for DeviceRecord {
    type Error = RepositoryError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        let device_type = row
            .device_type
            .parse::<DeviceType>()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let status = row
            .status
            .parse::<DeviceStatus>()
            .map_err(RepositoryError::Decode)?;

        Ok(DeviceRecord {
            id: row.id,
            tag: row.tag,
            name: row.name,
            device_type,
            location: row.location,
            status,
            warning_threshold: row.warning_threshold,
            critical_threshold: row.critical_threshold,
            unit: row.unit,
            is_controllable: row.is_controllable,
            is_active: row.is_active,
            telemetry_source: row.telemetry_source.filter(|path| !path.trim().is_empty()),
            created_at: row.created_at,
            last_updated_at: row.last_updated_at,
        })
    }
}

#[derive(Clone)]
pub struct DeviceTable;

impl Table for DeviceTable {
    fn name(&self) -> &'static str {
        "devices"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tag VARCHAR(64) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                device_type VARCHAR(64) NOT NULL,
                location VARCHAR(255) NOT NULL DEFAULT '',
                status VARCHAR(16) NOT NULL DEFAULT 'Offline',
                warning_threshold REAL,
                critical_threshold REAL,
                unit VARCHAR(32) NOT NULL DEFAULT '',
                is_controllable BOOLEAN NOT NULL DEFAULT FALSE,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                telemetry_source VARCHAR(255),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                last_updated_at TIMESTAMP
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS devices;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
