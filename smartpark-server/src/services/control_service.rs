use std::sync::Arc;

use serde_json::Value;
use smartpark_api::models::{ControlResponse, DeviceRecord, DeviceStatus, Id, StatusChange};
use time::OffsetDateTime;

use super::NotificationHub;
use crate::devices::DeviceRegistry;
use crate::errors::DeviceError;
use crate::models::EventLog;
use crate::repositories::{DeviceRepository, EventLogRepository};

pub const CONTROL_EVENT: &str = "DeviceControl";

/// The one synchronous entry point that mutates device state outside the
/// polling loop. Never fails; problems come back as an unsuccessful response.
pub struct ControlService {
    device_repository: Arc<dyn DeviceRepository>,
    event_log_repository: Arc<dyn EventLogRepository>,
    registry: Arc<DeviceRegistry>,
    hub: Arc<NotificationHub>,
}

impl ControlService {
    pub fn new(
        device_repository: Arc<dyn DeviceRepository>,
        event_log_repository: Arc<dyn EventLogRepository>,
        registry: Arc<DeviceRegistry>,
        hub: Arc<NotificationHub>,
    ) -> Self {
        Self {
            device_repository,
            event_log_repository,
            registry,
            hub,
        }
    }

    pub async fn control_device(&self, device_id: Id, command: &str, value: Option<&Value>) -> ControlResponse {
        match self.execute(device_id, command, value).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(device_id, command, error = %e, "Error controlling device");
                ControlResponse::failed(format!("Error: {e}"))
            },
        }
    }

    async fn execute(
        &self,
        device_id: Id,
        command: &str,
        value: Option<&Value>,
    ) -> Result<ControlResponse, DeviceError> {
        let Some(mut record) = self.device_repository.find_by_id(device_id).await? else {
            return Ok(ControlResponse::failed(format!("Device {device_id} not found")));
        };

        if !record.is_controllable {
            return Ok(ControlResponse::failed(format!("Device {} is not controllable", record.name)));
        }

        let device = self.registry.get_or_create(&record).await;
        let (accepted, status, current_value) = {
            let mut device = device.lock().await;
            let accepted = device.control(command, value)?;
            (accepted, device.status(), device.current_value())
        };

        if !accepted {
            return Ok(ControlResponse::failed(format!(
                "Failed to execute command '{command}' on {}",
                record.name
            )));
        }

        tracing::info!(device_id, tag = %record.tag, command, "Device command executed");
        self.log_control(&record, command, value).await;

        if status != record.status {
            self.persist_status(&mut record, status, current_value).await?;
        }

        Ok(ControlResponse::ok(format!(
            "Command '{command}' executed successfully on {}",
            record.name
        )))
    }

    async fn persist_status(
        &self,
        record: &mut DeviceRecord,
        status: DeviceStatus,
        value: f64,
    ) -> Result<(), DeviceError> {
        let previous = record.status;
        let now = OffsetDateTime::now_utc();

        record.status = status;
        record.last_updated_at = Some(now);
        self.device_repository.update(record).await?;

        self.hub
            .notify_status_change(&StatusChange {
                device_id: record.id,
                tag: record.tag.clone(),
                previous,
                current: status,
                value,
                timestamp: now,
            })
            .await;

        Ok(())
    }

    async fn log_control(&self, record: &DeviceRecord, command: &str, value: Option<&Value>) {
        let description = match value {
            Some(value) => format!(
                "Control command '{command}' with value '{value}' executed on device {}",
                record.name
            ),
            None => format!("Control command '{command}' executed on device {}", record.name),
        };

        let data = serde_json::json!({ "command": command, "value": value });
        let event = EventLog::new(CONTROL_EVENT, description)
            .with_device(record.id)
            .with_data(&data);
        if let Err(e) = self.event_log_repository.append(&event).await {
            tracing::warn!(device_id = record.id, error = %e, "Failed to record control event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;
    use smartpark_api::models::DeviceType;

    use super::*;
    use crate::configs::Telemetry;
    use crate::devices::DeviceFactory;
    use crate::repositories::{SqliteDeviceRepository, SqliteEventLogRepository};
    use crate::tests::{sample_record, setup_test_db};

    struct Fixture {
        service: ControlService,
        devices: Arc<SqliteDeviceRepository>,
        events: Arc<SqliteEventLogRepository>,
        registry: Arc<DeviceRegistry>,
    }

    async fn fixture() -> Fixture {
        let storage = setup_test_db().await;
        let devices = Arc::new(SqliteDeviceRepository::new(storage.clone()));
        let events = Arc::new(SqliteEventLogRepository::new(storage));
        let registry = Arc::new(DeviceRegistry::new(DeviceFactory::new(&Telemetry {
            root: PathBuf::from("."),
            poll_interval: 3,
            error_backoff: 5,
        })));

        let service = ControlService::new(
            devices.clone(),
            events.clone(),
            registry.clone(),
            Arc::new(NotificationHub::new()),
        );

        Fixture {
            service,
            devices,
            events,
            registry,
        }
    }

    #[tokio::test]
    async fn test_control_gate_logs_event() {
        let Fixture {
            service,
            devices,
            events,
            registry,
        } = fixture().await;
        let gate = devices
            .create(&sample_record("GATE-001", DeviceType::EntryGateBarrier))
            .await
            .unwrap();

        let response = service.control_device(gate.id, "open", None).await;
        assert!(response.success, "{}", response.message);

        let instance = registry.get(gate.id).await.unwrap();
        assert_eq!(instance.lock().await.current_value(), 100.0);

        let logged = events.find_recent(10).await.unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].event_type, CONTROL_EVENT);
        assert_eq!(logged[0].device_id, Some(gate.id));
        assert_eq!(logged[0].additional_data.as_deref(), Some(r#"{"command":"open","value":null}"#));

        let stored = devices.find_by_id(gate.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DeviceStatus::Normal);
    }

    #[tokio::test]
    async fn test_control_failures_are_reported_not_raised() {
        let Fixture { service, devices, events, .. } = fixture().await;
        let sensor = devices
            .create(&sample_record("TEMP-001", DeviceType::TemperatureSensor))
            .await
            .unwrap();
        let gate = devices
            .create(&sample_record("GATE-001", DeviceType::EntryGateBarrier))
            .await
            .unwrap();

        let missing = service.control_device(999, "open", None).await;
        assert!(!missing.success);
        assert_eq!(missing.message, "Device 999 not found");

        let passive = service.control_device(sensor.id, "open", None).await;
        assert!(!passive.success);
        assert!(passive.message.contains("not controllable"));

        let out_of_range = service.control_device(gate.id, "setposition", Some(&json!(150))).await;
        assert!(!out_of_range.success);

        assert!(events.find_recent(10).await.unwrap().is_empty());
    }
}
