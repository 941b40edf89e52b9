//! Persistence collaborators. The pipeline only sees the traits; the SQLite
//! implementations back the binary and the integration tests.

mod alert;
mod device;
mod event_log;
mod telemetry;

pub use alert::SqliteAlertRepository;
pub use device::SqliteDeviceRepository;
pub use event_log::SqliteEventLogRepository;
pub use telemetry::SqliteTelemetryRepository;

use async_trait::async_trait;
use smartpark_api::models::{Alert, DeviceRecord, Id, TelemetryReading};
use time::OffsetDateTime;

use crate::errors::RepositoryError;
use crate::models::EventLog;

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<DeviceRecord>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<DeviceRecord>, RepositoryError>;

    async fn find_by_id(&self, id: Id) -> Result<Option<DeviceRecord>, RepositoryError>;

    async fn find_by_tag(&self, tag: &str) -> Result<Option<DeviceRecord>, RepositoryError>;

    /// Inserts the record, ignoring its `id`, and returns the stored copy.
    async fn create(&self, record: &DeviceRecord) -> Result<DeviceRecord, RepositoryError>;

    async fn update(&self, record: &DeviceRecord) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    async fn append(
        &self,
        device_id: Id,
        value: f64,
        timestamp: OffsetDateTime,
    ) -> Result<TelemetryReading, RepositoryError>;

    /// Newest first.
    async fn find_by_device(&self, device_id: Id, count: u32) -> Result<Vec<TelemetryReading>, RepositoryError>;

    async fn find_latest(&self, device_id: Id) -> Result<Option<TelemetryReading>, RepositoryError>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Inserts the alert, ignoring its `id`, and returns the stored copy.
    async fn append(&self, alert: &Alert) -> Result<Alert, RepositoryError>;

    /// Fails with [`RepositoryError::NotFound`] for an unknown id.
    async fn acknowledge(&self, alert_id: Id, user_id: Id) -> Result<Alert, RepositoryError>;

    async fn find_by_id(&self, alert_id: Id) -> Result<Option<Alert>, RepositoryError>;

    async fn find_unacknowledged(&self) -> Result<Vec<Alert>, RepositoryError>;

    async fn find_by_device(&self, device_id: Id) -> Result<Vec<Alert>, RepositoryError>;
}

#[async_trait]
pub trait EventLogRepository: Send + Sync {
    async fn append(&self, event: &EventLog) -> Result<Id, RepositoryError>;

    async fn find_recent(&self, limit: u32) -> Result<Vec<EventLog>, RepositoryError>;
}
