use std::sync::Arc;

use async_trait::async_trait;
use smartpark_api::models::{DeviceRecord, Id};

use super::DeviceRepository;
use crate::configs::Storage;
use crate::errors::RepositoryError;
use crate::models::DeviceRow;

#[derive(Clone)]
pub struct SqliteDeviceRepository {
    storage: Arc<Storage>,
}

impl SqliteDeviceRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    fn into_records(rows: Vec<DeviceRow>) -> Result<Vec<DeviceRecord>, RepositoryError> {
        rows.into_iter().map(DeviceRecord::try_from).collect()
    }
}

#[async_trait]
impl DeviceRepository for SqliteDeviceRepository {
    async fn list_active(&self) -> Result<Vec<DeviceRecord>, RepositoryError> {
        let rows: Vec<DeviceRow> = sqlx::query_as("SELECT * FROM devices WHERE is_active = TRUE ORDER BY id")
            .fetch_all(self.storage.get_pool())
            .await?;

        Self::into_records(rows)
    }

    async fn list_all(&self) -> Result<Vec<DeviceRecord>, RepositoryError> {
        let rows: Vec<DeviceRow> = sqlx::query_as("SELECT * FROM devices ORDER BY id")
            .fetch_all(self.storage.get_pool())
            .await?;

        Self::into_records(rows)
    }

    async fn find_by_id(&self, id: Id) -> Result<Option<DeviceRecord>, RepositoryError> {
        let row: Option<DeviceRow> = sqlx::query_as("SELECT * FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        row.map(DeviceRecord::try_from).transpose()
    }

    async fn find_by_tag(&self, tag: &str) -> Result<Option<DeviceRecord>, RepositoryError> {
        let row: Option<DeviceRow> = sqlx::query_as("SELECT * FROM devices WHERE tag = $1")
            .bind(tag)
            .fetch_optional(self.storage.get_pool())
            .await?;

        row.map(DeviceRecord::try_from).transpose()
    }

    async fn create(&self, record: &DeviceRecord) -> Result<DeviceRecord, RepositoryError> {
        let row: DeviceRow = sqlx::query_as(
            r#"
            INSERT INTO devices (
                tag, name, device_type, location, status, warning_threshold, critical_threshold,
                unit, is_controllable, is_active, telemetry_source, created_at, last_updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&record.tag)
        .bind(&record.name)
        .bind(record.device_type.as_str())
        .bind(&record.location)
        .bind(record.status.as_str())
        .bind(record.warning_threshold)
        .bind(record.critical_threshold)
        .bind(&record.unit)
        .bind(record.is_controllable)
        .bind(record.is_active)
        .bind(&record.telemetry_source)
        .bind(record.created_at)
        .bind(record.last_updated_at)
        .fetch_one(self.storage.get_pool())
        .await?;

        DeviceRecord::try_from(row)
    }

    async fn update(&self, record: &DeviceRecord) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE devices
            SET tag = $1, name = $2, device_type = $3, location = $4, status = $5,
                warning_threshold = $6, critical_threshold = $7, unit = $8,
                is_controllable = $9, is_active = $10, telemetry_source = $11,
                last_updated_at = $12
            WHERE id = $13
            "#,
        )
        .bind(&record.tag)
        .bind(&record.name)
        .bind(record.device_type.as_str())
        .bind(&record.location)
        .bind(record.status.as_str())
        .bind(record.warning_threshold)
        .bind(record.critical_threshold)
        .bind(&record.unit)
        .bind(record.is_controllable)
        .bind(record.is_active)
        .bind(&record.telemetry_source)
        .bind(record.last_updated_at)
        .bind(record.id)
        .execute(self.storage.get_pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use smartpark_api::models::{DeviceStatus, DeviceType};
    use time::OffsetDateTime;

    use super::*;
    use crate::tests::{sample_record, setup_test_db};

    #[tokio::test]
    async fn test_create_and_find_device() {
        let storage = setup_test_db().await;
        let repo = SqliteDeviceRepository::new(storage);

        let created = repo
            .create(&sample_record("TEMP-001", DeviceType::TemperatureSensor))
            .await
            .unwrap();
        assert!(created.id > 0);
        assert_eq!(created.status, DeviceStatus::Offline);

        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.tag, "TEMP-001");
        assert_eq!(by_id.device_type, DeviceType::TemperatureSensor);

        let by_tag = repo.find_by_tag("TEMP-001").await.unwrap().unwrap();
        assert_eq!(by_tag.id, created.id);

        assert!(repo.find_by_tag("MISSING").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_skips_deactivated() {
        let storage = setup_test_db().await;
        let repo = SqliteDeviceRepository::new(storage);

        let mut gate = repo
            .create(&sample_record("GATE-001", DeviceType::EntryGateBarrier))
            .await
            .unwrap();
        repo.create(&sample_record("FAN-001", DeviceType::VentilationFan))
            .await
            .unwrap();

        gate.is_active = false;
        repo.update(&gate).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].tag, "FAN-001");
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_persists_status() {
        let storage = setup_test_db().await;
        let repo = SqliteDeviceRepository::new(storage);

        let mut device = repo
            .create(&sample_record("HUM-001", DeviceType::HumiditySensor))
            .await
            .unwrap();
        device.status = DeviceStatus::Critical;
        device.last_updated_at = Some(OffsetDateTime::now_utc());
        repo.update(&device).await.unwrap();

        let stored = repo.find_by_id(device.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DeviceStatus::Critical);
        assert!(stored.last_updated_at.is_some());

        device.id = 999;
        assert!(matches!(repo.update(&device).await, Err(RepositoryError::NotFound)));
    }
}
