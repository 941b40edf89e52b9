use std::sync::Arc;

use async_trait::async_trait;
use smartpark_api::models::{Alert, Id};
use time::OffsetDateTime;

use super::AlertRepository;
use crate::configs::Storage;
use crate::errors::RepositoryError;
use crate::models::AlertRow;

#[derive(Clone)]
pub struct SqliteAlertRepository {
    storage: Arc<Storage>,
}

impl SqliteAlertRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    fn into_alerts(rows: Vec<AlertRow>) -> Result<Vec<Alert>, RepositoryError> {
        rows.into_iter().map(Alert::try_from).collect()
    }
}

#[async_trait]
impl AlertRepository for SqliteAlertRepository {
    async fn append(&self, alert: &Alert) -> Result<Alert, RepositoryError> {
        let row: AlertRow = sqlx::query_as(
            r#"
            INSERT INTO alerts (
                device_id, severity, message, trigger_value, created_at,
                acknowledged, acknowledged_at, acknowledged_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(alert.device_id)
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .bind(alert.trigger_value)
        .bind(alert.created_at)
        .bind(alert.acknowledged)
        .bind(alert.acknowledged_at)
        .bind(alert.acknowledged_by)
        .fetch_one(self.storage.get_pool())
        .await?;

        Alert::try_from(row)
    }

    async fn acknowledge(&self, alert_id: Id, user_id: Id) -> Result<Alert, RepositoryError> {
        let row: Option<AlertRow> = sqlx::query_as(
            r#"
            UPDATE alerts
            SET acknowledged = TRUE, acknowledged_at = $1, acknowledged_by = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(OffsetDateTime::now_utc())
        .bind(user_id)
        .bind(alert_id)
        .fetch_optional(self.storage.get_pool())
        .await?;

        row.ok_or(RepositoryError::NotFound).and_then(Alert::try_from)
    }

    async fn find_by_id(&self, alert_id: Id) -> Result<Option<Alert>, RepositoryError> {
        let row: Option<AlertRow> = sqlx::query_as("SELECT * FROM alerts WHERE id = $1")
            .bind(alert_id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        row.map(Alert::try_from).transpose()
    }

    async fn find_unacknowledged(&self) -> Result<Vec<Alert>, RepositoryError> {
        let rows: Vec<AlertRow> =
            sqlx::query_as("SELECT * FROM alerts WHERE acknowledged = FALSE ORDER BY id DESC")
                .fetch_all(self.storage.get_pool())
                .await?;

        Self::into_alerts(rows)
    }

    async fn find_by_device(&self, device_id: Id) -> Result<Vec<Alert>, RepositoryError> {
        let rows: Vec<AlertRow> = sqlx::query_as("SELECT * FROM alerts WHERE device_id = $1 ORDER BY id DESC")
            .bind(device_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Self::into_alerts(rows)
    }
}
