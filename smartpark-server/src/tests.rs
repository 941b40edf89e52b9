//! Fixtures shared by unit and integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use smartpark_api::models::{Alert, DeviceRecord, DeviceStatus, DeviceType, Id};
use time::OffsetDateTime;

use crate::configs::{Database, SchemaManager, Storage};
use crate::errors::RepositoryError;
use crate::repositories::AlertRepository;

/// Fresh in-memory database with the full schema. A single connection keeps
/// every query on the same memory database.
pub async fn setup_test_db() -> Arc<Storage> {
    Arc::new(
        Storage::new(
            Database {
                url: String::from("sqlite::memory:"),
                clean_start: true,
                max_connections: 1,
            },
            SchemaManager::default(),
        )
        .await
        .unwrap(),
    )
}

/// Active record with type defaults, no thresholds and no telemetry source.
pub fn sample_record(tag: &str, device_type: DeviceType) -> DeviceRecord {
    DeviceRecord {
        id: 0,
        tag: tag.to_string(),
        name: format!("{tag} ({device_type})"),
        device_type,
        location: String::from("Level 1"),
        status: DeviceStatus::Offline,
        warning_threshold: None,
        critical_threshold: None,
        unit: device_type.default_unit().to_string(),
        is_controllable: device_type.is_controllable(),
        is_active: true,
        telemetry_source: None,
        created_at: OffsetDateTime::now_utc(),
        last_updated_at: None,
    }
}

/// Alert store whose writes always fail. Reads see an empty store.
pub struct FailingAlertRepository;

#[async_trait]
impl AlertRepository for FailingAlertRepository {
    async fn append(&self, _alert: &Alert) -> Result<Alert, RepositoryError> {
        Err(RepositoryError::Decode(String::from("alert store unavailable")))
    }

    async fn acknowledge(&self, _alert_id: Id, _user_id: Id) -> Result<Alert, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, _alert_id: Id) -> Result<Option<Alert>, RepositoryError> {
        Ok(None)
    }

    async fn find_unacknowledged(&self) -> Result<Vec<Alert>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn find_by_device(&self, _device_id: Id) -> Result<Vec<Alert>, RepositoryError> {
        Ok(Vec::new())
    }
}
