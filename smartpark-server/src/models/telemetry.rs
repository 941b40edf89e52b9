use smartpark_api::models::TelemetryReading;
use time::OffsetDateTime;

use super::Table;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TelemetryRow {
    pub id: i32,
    pub device_id: i32,
    pub value: f64,
    pub timestamp: OffsetDateTime,
}

impl From<TelemetryRow> for TelemetryReading {
    fn from(row: TelemetryRow) -> Self {
        TelemetryReading {
            id: row.id,
            device_id: row.device_id,
            value: row.value,
            timestamp: row.timestamp,
        }
    }
}

#[derive(Clone)]
pub struct TelemetryTable;

impl Table for TelemetryTable {
    fn name(&self) -> &'static str {
        "telemetry_readings"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS telemetry_readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id INTEGER NOT NULL,
                value REAL NOT NULL,
                timestamp TIMESTAMP NOT NULL,
                FOREIGN KEY (device_id) REFERENCES devices (id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_telemetry_device_time
                ON telemetry_readings (device_id, timestamp);
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS telemetry_readings;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["devices"]
    }
}
