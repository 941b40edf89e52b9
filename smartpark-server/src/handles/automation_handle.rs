use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use smartpark_api::models::AutomationState;

use crate::services::SystemState;

#[derive(Clone)]
pub struct SystemStateHandle {
    pub system_state: Arc<SystemState>,
}

pub fn automation_router(state: SystemStateHandle) -> Router {
    Router::new()
        .route("/automation", get(get_automation).put(update_automation))
        .with_state(state)
}

pub async fn get_automation(State(state): State<SystemStateHandle>) -> Json<AutomationState> {
    Json(AutomationState {
        enabled: state.system_state.is_auto_mode(),
    })
}

pub async fn update_automation(
    State(state): State<SystemStateHandle>,
    Json(body): Json<AutomationState>,
) -> Json<AutomationState> {
    state.system_state.set_auto_mode(body.enabled);

    Json(AutomationState {
        enabled: state.system_state.is_auto_mode(),
    })
}
