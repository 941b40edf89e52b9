use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use smartpark_api::models::*;

use crate::devices::DeviceRegistry;
use crate::errors::{ApiError, DeviceError};
use crate::repositories::DeviceRepository;
use crate::services::{AlertService, ControlService, TelemetryService};

#[derive(Clone)]
pub struct DeviceState {
    pub device_repository: Arc<dyn DeviceRepository>,
    pub registry: Arc<DeviceRegistry>,
    pub telemetry_service: Arc<TelemetryService>,
    pub alert_service: Arc<AlertService>,
    pub control_service: Arc<ControlService>,
}

pub fn device_router(device_state: DeviceState) -> Router {
    Router::new()
        .route("/devices", get(get_devices))
        .route("/devices/:device_id", get(get_device_by_id))
        .route("/devices/:device_id/telemetry", get(get_device_telemetry))
        .route("/devices/:device_id/alerts", get(get_device_alerts))
        .route("/devices/:device_id/control", post(control_device))
        .with_state(device_state)
}

pub async fn get_devices(State(state): State<DeviceState>) -> Result<Json<Vec<DeviceSnapshot>>, ApiError> {
    let records = state.device_repository.list_all().await?;

    let mut snapshots = Vec::with_capacity(records.len());
    for record in records {
        snapshots.push(snapshot(&state, record).await?);
    }

    Ok(Json(snapshots))
}

pub async fn get_device_by_id(
    State(state): State<DeviceState>,
    Path(device_id): Path<Id>,
) -> Result<Json<DeviceSnapshot>, ApiError> {
    let record = state
        .device_repository
        .find_by_id(device_id)
        .await?
        .ok_or(DeviceError::DeviceNotFound)?;

    Ok(Json(snapshot(&state, record).await?))
}

pub async fn get_device_telemetry(
    State(state): State<DeviceState>,
    Path(device_id): Path<Id>,
    Query(query): Query<TelemetryQuery>,
) -> Result<Json<Vec<TelemetryReading>>, ApiError> {
    // Check if device exists
    state
        .device_repository
        .find_by_id(device_id)
        .await?
        .ok_or(DeviceError::DeviceNotFound)?;

    let readings = state.telemetry_service.history(device_id, query.count).await?;

    Ok(Json(readings))
}

pub async fn get_device_alerts(
    State(state): State<DeviceState>,
    Path(device_id): Path<Id>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    state
        .device_repository
        .find_by_id(device_id)
        .await?
        .ok_or(DeviceError::DeviceNotFound)?;

    let alerts = state.alert_service.device_alerts(device_id).await?;

    Ok(Json(alerts))
}

/// Failures are reported in the body with `success: false`.
pub async fn control_device(
    State(state): State<DeviceState>,
    Path(device_id): Path<Id>,
    Json(body): Json<ControlRequest>,
) -> Json<ControlResponse> {
    let response = state
        .control_service
        .control_device(device_id, &body.command, body.value.as_ref())
        .await;

    Json(response)
}

async fn snapshot(state: &DeviceState, record: DeviceRecord) -> Result<DeviceSnapshot, ApiError> {
    let latest_reading = state.telemetry_service.latest(record.id).await?;

    // Devices never polled or controlled have no live instance yet
    let Some(device) = state.registry.get(record.id).await else {
        return Ok(DeviceSnapshot {
            record,
            current_value: None,
            last_update: None,
            details: None,
            latest_reading,
        });
    };

    let device = device.lock().await;
    Ok(DeviceSnapshot {
        current_value: device.last_update().map(|_| device.current_value()),
        last_update: device.last_update(),
        details: device.details(),
        latest_reading,
        record,
    })
}
