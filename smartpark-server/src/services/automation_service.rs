use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use smartpark_api::models::DeviceType;
use time::OffsetDateTime;
use tokio::sync::watch;

use super::{ControlService, SystemState};
use crate::configs::Automation;
use crate::devices::DeviceRegistry;
use crate::errors::RepositoryError;
use crate::repositories::DeviceRepository;

/// Aggregate parking occupancy as seen by the automation rules.
#[async_trait]
pub trait OccupancySource: Send + Sync {
    async fn any_occupied(&self) -> bool;
}

/// Reads occupancy from the live instances of the active slot sensors.
/// Deactivated sensors keep their cached instance but no longer count.
pub struct RegistryOccupancy {
    device_repository: Arc<dyn DeviceRepository>,
    registry: Arc<DeviceRegistry>,
}

impl RegistryOccupancy {
    pub fn new(device_repository: Arc<dyn DeviceRepository>, registry: Arc<DeviceRegistry>) -> Self {
        Self {
            device_repository,
            registry,
        }
    }
}

#[async_trait]
impl OccupancySource for RegistryOccupancy {
    async fn any_occupied(&self) -> bool {
        let records = match self.device_repository.list_active().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list slot sensors, assuming no occupancy");
                return false;
            },
        };

        for record in records.iter().filter(|record| record.device_type == DeviceType::SlotSensor) {
            let Some(device) = self.registry.get(record.id).await else {
                continue;
            };

            if device.lock().await.is_occupied() == Some(true) {
                return true;
            }
        }

        false
    }
}

/// Keeps lighting on at night or while any slot is occupied.
pub struct AutomationService {
    device_repository: Arc<dyn DeviceRepository>,
    registry: Arc<DeviceRegistry>,
    control_service: Arc<ControlService>,
    occupancy: Arc<dyn OccupancySource>,
    state: Arc<SystemState>,
    settings: Automation,
}

impl AutomationService {
    pub fn new(
        device_repository: Arc<dyn DeviceRepository>,
        registry: Arc<DeviceRegistry>,
        control_service: Arc<ControlService>,
        occupancy: Arc<dyn OccupancySource>,
        state: Arc<SystemState>,
        settings: Automation,
    ) -> Self {
        Self {
            device_repository,
            registry,
            control_service,
            occupancy,
            state,
            settings,
        }
    }

    /// Ticks on the configured interval, and right away whenever the auto
    /// mode flag flips. A failing or panicking tick is logged and the loop
    /// carries on.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut auto_mode = self.state.watch();
        tracing::info!(interval = ?self.settings.interval(), "Automation loop started");

        while !*shutdown.borrow_and_update() {
            match AssertUnwindSafe(self.run_once()).catch_unwind().await {
                Ok(Ok(issued)) => tracing::debug!(issued, "Automation tick finished"),
                Ok(Err(e)) => tracing::error!(error = %e, "Automation tick failed"),
                Err(_) => tracing::error!("Automation tick panicked"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval()) => {},
                // The sender lives in `self.state`, so this never errors
                Ok(()) = auto_mode.changed() => {
                    tracing::debug!(enabled = *auto_mode.borrow_and_update(), "Auto mode flipped, re-evaluating");
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                },
            }
        }

        tracing::info!("Automation loop stopped");
    }

    /// Evaluates the rules against the local clock.
    pub async fn run_once(&self) -> Result<usize, RepositoryError> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.run_once_at(now.hour()).await
    }

    /// Returns the number of commands issued. Lights already in the desired
    /// state are left alone.
    pub async fn run_once_at(&self, hour: u8) -> Result<usize, RepositoryError> {
        if !self.state.is_auto_mode() {
            return Ok(0);
        }

        let lights: Vec<_> = self
            .device_repository
            .list_active()
            .await?
            .into_iter()
            .filter(|record| record.device_type == DeviceType::SmartLighting && record.is_controllable)
            .collect();

        if lights.is_empty() {
            return Ok(0);
        }

        let should_be_on = self.settings.is_night(hour) || self.occupancy.any_occupied().await;
        let command = if should_be_on { "on" } else { "off" };
        let mut issued = 0;

        for light in lights {
            let device = self.registry.get_or_create(&light).await;
            let is_on = device.lock().await.is_light_on().unwrap_or(false);

            if is_on == should_be_on {
                continue;
            }

            let response = self.control_service.control_device(light.id, command, None).await;
            if !response.success {
                tracing::warn!(device_id = light.id, tag = %light.tag, "{}", response.message);
            }
            issued += 1;
        }

        Ok(issued)
    }
}
