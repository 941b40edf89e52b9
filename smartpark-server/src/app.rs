use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{DeviceSeed, SchemaManager, Settings, Storage};
use crate::devices::{DeviceFactory, DeviceRegistry};
use crate::errors::RepositoryError;
use crate::handles::*;
use crate::repositories::{
    DeviceRepository, SqliteAlertRepository, SqliteDeviceRepository, SqliteEventLogRepository,
    SqliteTelemetryRepository,
};
use crate::services::*;

const BROADCAST_CAPACITY: usize = 100;

/// Every long-lived component of the server, wired once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub storage: Arc<Storage>,
    pub device_repository: Arc<dyn DeviceRepository>,
    pub registry: Arc<DeviceRegistry>,
    pub hub: Arc<NotificationHub>,
    pub broadcast: Arc<BroadcastSubscriber>,
    pub system_state: Arc<SystemState>,
    pub telemetry_service: Arc<TelemetryService>,
    pub alert_service: Arc<AlertService>,
    pub control_service: Arc<ControlService>,
    pub polling_service: Arc<PollingService>,
    pub automation_service: Arc<AutomationService>,
}

impl AppContext {
    pub async fn new(settings: &Settings) -> Result<Self, sqlx::Error> {
        let storage = Arc::new(Storage::new(settings.database.clone(), SchemaManager::default()).await?);

        Ok(Self::with_storage(storage, settings, DeviceFactory::new(&settings.telemetry)))
    }

    pub fn with_storage(storage: Arc<Storage>, settings: &Settings, factory: DeviceFactory) -> Self {
        let device_repository: Arc<dyn DeviceRepository> = Arc::new(SqliteDeviceRepository::new(storage.clone()));
        let telemetry_repository = Arc::new(SqliteTelemetryRepository::new(storage.clone()));
        let alert_repository = Arc::new(SqliteAlertRepository::new(storage.clone()));
        let event_log_repository = Arc::new(SqliteEventLogRepository::new(storage.clone()));

        let hub = Arc::new(NotificationHub::new());
        let broadcast = Arc::new(BroadcastSubscriber::new(BROADCAST_CAPACITY));
        hub.attach(broadcast.clone());

        let registry = Arc::new(DeviceRegistry::new(factory));
        let system_state = Arc::new(SystemState::new(settings.automation.enabled));

        let telemetry_service = Arc::new(TelemetryService::new(
            telemetry_repository,
            device_repository.clone(),
            hub.clone(),
        ));
        let alert_service = Arc::new(AlertService::new(
            alert_repository,
            device_repository.clone(),
            hub.clone(),
            settings.alerting.cooldown(),
        ));
        let control_service = Arc::new(ControlService::new(
            device_repository.clone(),
            event_log_repository,
            registry.clone(),
            hub.clone(),
        ));
        let polling_service = Arc::new(PollingService::new(
            device_repository.clone(),
            registry.clone(),
            telemetry_service.clone(),
            alert_service.clone(),
            &settings.telemetry,
        ));
        let automation_service = Arc::new(AutomationService::new(
            device_repository.clone(),
            registry.clone(),
            control_service.clone(),
            Arc::new(RegistryOccupancy::new(device_repository.clone(), registry.clone())),
            system_state.clone(),
            settings.automation.clone(),
        ));

        Self {
            storage,
            device_repository,
            registry,
            hub,
            broadcast,
            system_state,
            telemetry_service,
            alert_service,
            control_service,
            polling_service,
            automation_service,
        }
    }

    /// Registers seeds whose tag is not stored yet. Returns how many were added.
    pub async fn seed_devices(&self, seeds: &[DeviceSeed]) -> Result<usize, RepositoryError> {
        let mut created = 0;

        for seed in seeds {
            if self.device_repository.find_by_tag(&seed.tag).await?.is_some() {
                continue;
            }

            let record = self.device_repository.create(&seed.to_record()).await?;
            tracing::info!(device_id = record.id, tag = %record.tag, "Registered device");
            created += 1;
        }

        Ok(created)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .merge(device_router(DeviceState {
                device_repository: self.device_repository.clone(),
                registry: self.registry.clone(),
                telemetry_service: self.telemetry_service.clone(),
                alert_service: self.alert_service.clone(),
                control_service: self.control_service.clone(),
            }))
            .merge(alert_router(AlertState {
                alert_service: self.alert_service.clone(),
            }))
            .merge(automation_router(SystemStateHandle {
                system_state: self.system_state.clone(),
            }))
            .merge(sse_router(SSEState {
                broadcast: self.broadcast.clone(),
            }))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }
}
