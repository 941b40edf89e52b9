use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use smartpark_api::models::{
    AlertNotice, AlertSeverity, DeviceStatus, DeviceType, Notification, StatusChange,
};
use smartpark_server::errors::NotifyError;
use smartpark_server::services::{PollReport, Subscriber};
use smartpark_server::tests::sample_record;

mod common;
use common::mock_app::MockApp;

#[derive(Default)]
struct Recorder {
    changes: Mutex<Vec<(DeviceStatus, DeviceStatus)>>,
    alerts: Mutex<Vec<AlertSeverity>>,
}

#[async_trait]
impl Subscriber for Recorder {
    async fn on_status_change(&self, change: &StatusChange) -> Result<(), NotifyError> {
        self.changes.lock().unwrap().push((change.previous, change.current));
        Ok(())
    }

    async fn on_alert(&self, alert: &AlertNotice) -> Result<(), NotifyError> {
        self.alerts.lock().unwrap().push(alert.alert.severity);
        Ok(())
    }
}

#[tokio::test]
async fn test_poll_drives_status_and_alerts() {
    let app = MockApp::new().await;
    app.write_source("temperature.txt", "20\n32\n36\n");

    let mut sensor = sample_record("TEMP-001", DeviceType::TemperatureSensor);
    sensor.warning_threshold = Some(30.0);
    sensor.critical_threshold = Some(35.0);
    sensor.telemetry_source = Some(String::from("temperature.txt"));
    let sensor = app.create_device(&sensor).await;

    let recorder = Arc::new(Recorder::default());
    assert!(app.context.hub.attach(recorder.clone()));
    let mut events = app.context.broadcast.subscribe();

    for _ in 0..3 {
        let report = app.context.polling_service.poll_once().await.unwrap();
        assert_eq!(report, PollReport { polled: 1, skipped: 0, failed: 0 });
    }

    assert_eq!(*recorder.changes.lock().unwrap(), vec![
        (DeviceStatus::Offline, DeviceStatus::Normal),
        (DeviceStatus::Normal, DeviceStatus::Warning),
        (DeviceStatus::Warning, DeviceStatus::Critical),
    ]);

    // The critical reading lands inside the cooldown window of the first alert
    assert_eq!(*recorder.alerts.lock().unwrap(), vec![AlertSeverity::Warning]);

    let stored = app
        .context
        .device_repository
        .find_by_id(sensor.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, DeviceStatus::Critical);

    let mut kinds = Vec::new();
    while let Ok(notification) = events.try_recv() {
        kinds.push(notification.kind());
        if let Notification::Alert(notice) = notification {
            assert_eq!(notice.device_tag, "TEMP-001");
        }
    }
    assert_eq!(kinds.iter().filter(|kind| **kind == "telemetry").count(), 3);
    assert_eq!(kinds.iter().filter(|kind| **kind == "status_change").count(), 3);
    assert_eq!(kinds.iter().filter(|kind| **kind == "alert").count(), 1);
}

#[tokio::test]
async fn test_automation_follows_day_cycle() {
    let app = MockApp::new().await;
    let light = app
        .create_device(&sample_record("LIGHT-001", DeviceType::SmartLighting))
        .await;

    assert_eq!(app.context.automation_service.run_once_at(22).await.unwrap(), 1);
    assert_eq!(app.context.automation_service.run_once_at(23).await.unwrap(), 0);

    let instance = app.context.registry.get(light.id).await.unwrap();
    assert_eq!(instance.lock().await.is_light_on(), Some(true));

    assert_eq!(app.context.automation_service.run_once_at(12).await.unwrap(), 1);
    assert_eq!(instance.lock().await.is_light_on(), Some(false));

    app.context.system_state.set_auto_mode(false);
    assert_eq!(app.context.automation_service.run_once_at(22).await.unwrap(), 0);
    assert_eq!(instance.lock().await.is_light_on(), Some(false));
}
