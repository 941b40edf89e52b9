use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

/// Audit trail entry. Appends are best effort.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventLog {
    pub id: i32,
    pub event_type: String,
    pub description: String,
    pub device_id: Option<i32>,
    pub user_id: Option<i32>,
    pub additional_data: Option<String>,
    pub timestamp: OffsetDateTime,
}

impl EventLog {
    pub fn new(event_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            event_type: event_type.into(),
            description: description.into(),
            device_id: None,
            user_id: None,
            additional_data: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_device(mut self, device_id: i32) -> Self {
        self.device_id = Some(device_id);
        self
    }

    pub fn with_data(mut self, data: &serde_json::Value) -> Self {
        self.additional_data = Some(data.to_string());
        self
    }
}

#[derive(Clone)]
pub struct EventLogTable;

impl Table for EventLogTable {
    fn name(&self) -> &'static str {
        "event_logs"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS event_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type VARCHAR(64) NOT NULL,
                description TEXT NOT NULL,
                device_id INTEGER,
                user_id INTEGER,
                additional_data TEXT,
                timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (device_id) REFERENCES devices (id) ON DELETE SET NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS event_logs;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["devices"]
    }
}
