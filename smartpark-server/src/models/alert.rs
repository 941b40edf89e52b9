use smartpark_api::models::{Alert, AlertSeverity};
use time::OffsetDateTime;

use super::Table;
use crate::errors::RepositoryError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    pub id: i32,
    pub device_id: Option<i32>,
    pub severity: String,
    pub message: String,
    pub trigger_value: f64,
    pub created_at: OffsetDateTime,
    pub acknowledged: bool,
    pub acknowledged_at: Option<OffsetDateTime>,
    pub acknowledged_by: Option<i32>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = RepositoryError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let severity = row
            .severity
            .parse::<AlertSeverity>()
            .map_err(RepositoryError::Decode)?;

        Ok(Alert {
            id: row.id,
            device_id: row.device_id,
            severity,
            message: row.message,
            trigger_value: row.trigger_value,
            created_at: row.created_at,
            acknowledged: row.acknowledged,
            acknowledged_at: row.acknowledged_at,
            acknowledged_by: row.acknowledged_by,
        })
    }
}

#[derive(Clone)]
pub struct AlertTable;

impl Table for AlertTable {
    fn name(&self) -> &'static str {
        "alerts"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id INTEGER,
                severity VARCHAR(16) NOT NULL,
                message TEXT NOT NULL,
                trigger_value REAL NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                acknowledged BOOLEAN NOT NULL DEFAULT FALSE,
                acknowledged_at TIMESTAMP,
                acknowledged_by INTEGER,
                FOREIGN KEY (device_id) REFERENCES devices (id) ON DELETE SET NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS alerts;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["devices"]
    }
}
