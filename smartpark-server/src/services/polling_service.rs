use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use smartpark_api::models::DeviceRecord;
use tokio::sync::watch;

use super::{AlertService, TelemetryService};
use crate::configs::Telemetry;
use crate::devices::DeviceRegistry;
use crate::errors::{DeviceError, RepositoryError};
use crate::repositories::DeviceRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingState {
    Stopped,
    Running,
}

/// Outcome of a single pass over the active devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    pub polled: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct PollingService {
    device_repository: Arc<dyn DeviceRepository>,
    registry: Arc<DeviceRegistry>,
    telemetry_service: Arc<TelemetryService>,
    alert_service: Arc<AlertService>,
    interval: Duration,
    error_backoff: Duration,
    running: AtomicBool,
}

impl PollingService {
    pub fn new(
        device_repository: Arc<dyn DeviceRepository>,
        registry: Arc<DeviceRegistry>,
        telemetry_service: Arc<TelemetryService>,
        alert_service: Arc<AlertService>,
        telemetry: &Telemetry,
    ) -> Self {
        Self {
            device_repository,
            registry,
            telemetry_service,
            alert_service,
            interval: telemetry.poll_interval(),
            error_backoff: telemetry.error_backoff(),
            running: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> PollingState {
        if self.running.load(Ordering::Acquire) {
            PollingState::Running
        } else {
            PollingState::Stopped
        }
    }

    /// Polls until `shutdown` turns true or its sender goes away. The signal
    /// is checked between ticks and interrupts the inter-tick delay. A tick
    /// that fails or panics is followed by the error backoff instead of the
    /// poll interval.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        self.running.store(true, Ordering::Release);
        tracing::info!(interval = ?self.interval, "Telemetry polling started");

        while !*shutdown.borrow_and_update() {
            let delay = match AssertUnwindSafe(self.poll_once()).catch_unwind().await {
                Ok(Ok(report)) => {
                    tracing::debug!(?report, "Polling tick finished");
                    self.interval
                },
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Polling tick failed");
                    self.error_backoff
                },
                Err(_) => {
                    tracing::error!("Polling tick panicked");
                    self.error_backoff
                },
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {},
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                },
            }
        }

        self.running.store(false, Ordering::Release);
        tracing::info!("Telemetry polling stopped");
    }

    /// One pass over every active device. Only failing to list the devices
    /// fails the pass; per-device problems are logged and counted.
    pub async fn poll_once(&self) -> Result<PollReport, RepositoryError> {
        let mut report = PollReport::default();

        for record in self.device_repository.list_active().await? {
            let (device_id, tag) = (record.id, record.tag.clone());

            match self.poll_device(record).await {
                Ok(true) => report.polled += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(device_id, tag = %tag, error = %e, "Failed to poll device");
                    report.failed += 1;
                },
            }
        }

        Ok(report)
    }

    async fn poll_device(&self, mut record: DeviceRecord) -> Result<bool, DeviceError> {
        let device = self.registry.get_or_create(&record).await;

        let value = {
            let mut device = device.lock().await;
            device.refresh(&record);

            if record.device_type.requires_source() && device.source().is_none() {
                tracing::debug!(device_id = record.id, tag = %record.tag, "No telemetry source, skipping");
                return Ok(false);
            }

            device.read_telemetry().await?
        };

        self.telemetry_service.process(&mut record, value).await?;
        self.alert_service.check_and_generate(&record, value).await;

        Ok(true)
    }
}
