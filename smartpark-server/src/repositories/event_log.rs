use std::sync::Arc;

use async_trait::async_trait;
use smartpark_api::models::Id;

use super::EventLogRepository;
use crate::configs::Storage;
use crate::errors::RepositoryError;
use crate::models::EventLog;

#[derive(Clone)]
pub struct SqliteEventLogRepository {
    storage: Arc<Storage>,
}

impl SqliteEventLogRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl EventLogRepository for SqliteEventLogRepository {
    async fn append(&self, event: &EventLog) -> Result<Id, RepositoryError> {
        let id = sqlx::query(
            r#"
            INSERT INTO event_logs (event_type, description, device_id, user_id, additional_data, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&event.event_type)
        .bind(&event.description)
        .bind(event.device_id)
        .bind(event.user_id)
        .bind(&event.additional_data)
        .bind(event.timestamp)
        .execute(self.storage.get_pool())
        .await?
        .last_insert_rowid();

        Ok(id as Id)
    }

    async fn find_recent(&self, limit: u32) -> Result<Vec<EventLog>, RepositoryError> {
        let events: Vec<EventLog> = sqlx::query_as("SELECT * FROM event_logs ORDER BY id DESC LIMIT $1")
            .bind(limit)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(events)
    }
}
