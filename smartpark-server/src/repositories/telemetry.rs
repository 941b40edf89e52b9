use std::sync::Arc;

use async_trait::async_trait;
use smartpark_api::models::{Id, TelemetryReading};
use time::OffsetDateTime;

use super::TelemetryRepository;
use crate::configs::Storage;
use crate::errors::RepositoryError;
use crate::models::TelemetryRow;

#[derive(Clone)]
pub struct SqliteTelemetryRepository {
    storage: Arc<Storage>,
}

impl SqliteTelemetryRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl TelemetryRepository for SqliteTelemetryRepository {
    async fn append(
        &self,
        device_id: Id,
        value: f64,
        timestamp: OffsetDateTime,
    ) -> Result<TelemetryReading, RepositoryError> {
        let row: TelemetryRow = sqlx::query_as(
            r#"
            INSERT INTO telemetry_readings (device_id, value, timestamp)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(device_id)
        .bind(value)
        .bind(timestamp)
        .fetch_one(self.storage.get_pool())
        .await?;

        Ok(row.into())
    }

    async fn find_by_device(&self, device_id: Id, count: u32) -> Result<Vec<TelemetryReading>, RepositoryError> {
        let rows: Vec<TelemetryRow> = sqlx::query_as(
            "SELECT * FROM telemetry_readings WHERE device_id = $1 ORDER BY id DESC LIMIT $2",
        )
        .bind(device_id)
        .bind(count)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(rows.into_iter().map(TelemetryReading::from).collect())
    }

    async fn find_latest(&self, device_id: Id) -> Result<Option<TelemetryReading>, RepositoryError> {
        Ok(self.find_by_device(device_id, 1).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use smartpark_api::models::DeviceType;

    use super::*;
    use crate::repositories::{DeviceRepository, SqliteDeviceRepository};
    use crate::tests::{sample_record, setup_test_db};

    #[tokio::test]
    async fn test_readings_are_returned_newest_first() {
        let storage = setup_test_db().await;
        let device = SqliteDeviceRepository::new(storage.clone())
            .create(&sample_record("TEMP-001", DeviceType::TemperatureSensor))
            .await
            .unwrap();
        let repo = SqliteTelemetryRepository::new(storage);

        for value in [70.0, 71.5, 73.0] {
            repo.append(device.id, value, OffsetDateTime::now_utc()).await.unwrap();
        }

        let readings = repo.find_by_device(device.id, 2).await.unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].value, 73.0);
        assert_eq!(readings[1].value, 71.5);

        let latest = repo.find_latest(device.id).await.unwrap().unwrap();
        assert_eq!(latest.value, 73.0);
        assert!(repo.find_latest(device.id + 1).await.unwrap().is_none());
    }
}
