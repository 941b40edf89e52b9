use std::sync::Arc;

use smartpark_api::models::{DeviceRecord, Id, StatusChange, TelemetryReading, TelemetryUpdate};
use time::OffsetDateTime;

use super::NotificationHub;
use crate::errors::RepositoryError;
use crate::repositories::{DeviceRepository, TelemetryRepository};

pub const DEFAULT_HISTORY: u32 = 100;

pub struct TelemetryService {
    telemetry_repository: Arc<dyn TelemetryRepository>,
    device_repository: Arc<dyn DeviceRepository>,
    hub: Arc<NotificationHub>,
}

impl TelemetryService {
    pub fn new(
        telemetry_repository: Arc<dyn TelemetryRepository>,
        device_repository: Arc<dyn DeviceRepository>,
        hub: Arc<NotificationHub>,
    ) -> Self {
        Self {
            telemetry_repository,
            device_repository,
            hub,
        }
    }

    /// Stores the reading, folds it into the record's status and publishes
    /// the update. A status change notice follows when the status moved.
    pub async fn process(&self, record: &mut DeviceRecord, value: f64) -> Result<TelemetryReading, RepositoryError> {
        let now = OffsetDateTime::now_utc();
        let reading = self.telemetry_repository.append(record.id, value, now).await?;

        let previous = record.status;
        record.status = record.thresholds().status(value);
        record.last_updated_at = Some(now);
        self.device_repository.update(record).await?;

        self.hub
            .notify_telemetry(&TelemetryUpdate {
                device_id: record.id,
                tag: record.tag.clone(),
                value,
                unit: record.unit.clone(),
                status: record.status,
                timestamp: now,
            })
            .await;

        if previous != record.status {
            tracing::info!(
                device_id = record.id,
                tag = %record.tag,
                from = %previous,
                to = %record.status,
                "Device status changed"
            );

            self.hub
                .notify_status_change(&StatusChange {
                    device_id: record.id,
                    tag: record.tag.clone(),
                    previous,
                    current: record.status,
                    value,
                    timestamp: now,
                })
                .await;
        }

        Ok(reading)
    }

    /// Newest first.
    pub async fn history(&self, device_id: Id, count: Option<u32>) -> Result<Vec<TelemetryReading>, RepositoryError> {
        self.telemetry_repository
            .find_by_device(device_id, count.unwrap_or(DEFAULT_HISTORY))
            .await
    }

    pub async fn latest(&self, device_id: Id) -> Result<Option<TelemetryReading>, RepositoryError> {
        self.telemetry_repository.find_latest(device_id).await
    }
}
