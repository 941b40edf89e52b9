use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use smartpark_api::models::*;

use crate::errors::ApiError;
use crate::services::AlertService;

#[derive(Clone)]
pub struct AlertState {
    pub alert_service: Arc<AlertService>,
}

pub fn alert_router(alert_state: AlertState) -> Router {
    Router::new()
        .route("/alerts", get(get_unacknowledged_alerts).post(create_alert))
        .route("/alerts/:alert_id", get(get_alert_by_id))
        .route("/alerts/:alert_id/acknowledge", post(acknowledge_alert))
        .with_state(alert_state)
}

pub async fn get_unacknowledged_alerts(State(state): State<AlertState>) -> Result<Json<Vec<Alert>>, ApiError> {
    Ok(Json(state.alert_service.unacknowledged().await?))
}

pub async fn create_alert(
    State(state): State<AlertState>,
    Json(body): Json<CreateAlertRequest>,
) -> Result<Json<Alert>, ApiError> {
    let alert = state
        .alert_service
        .create_manual(body.device_id, body.severity, &body.message)
        .await?;

    Ok(Json(alert))
}

pub async fn get_alert_by_id(
    State(state): State<AlertState>,
    Path(alert_id): Path<Id>,
) -> Result<Json<Alert>, ApiError> {
    Ok(Json(state.alert_service.get(alert_id).await?))
}

pub async fn acknowledge_alert(
    State(state): State<AlertState>,
    Path(alert_id): Path<Id>,
    Json(body): Json<AcknowledgeAlertRequest>,
) -> Result<Json<Alert>, ApiError> {
    Ok(Json(state.alert_service.acknowledge(alert_id, body.user_id).await?))
}
