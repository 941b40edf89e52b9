pub mod alert;
pub mod api;
pub mod device;
pub mod notify;
pub mod repository;
pub mod telemetry;

pub use alert::AlertError;
pub use api::ApiError;
pub use device::DeviceError;
pub use notify::NotifyError;
pub use repository::RepositoryError;
pub use telemetry::TelemetryError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_id) = match self {
            ApiError::DeviceError(e) => match e.status_code() {
                StatusCode::INTERNAL_SERVER_ERROR => internal("Device error", &e),
                status => (status, e.to_string(), None),
            },
            ApiError::AlertError(e) => match e.status_code() {
                StatusCode::INTERNAL_SERVER_ERROR => internal("Alert error", &e),
                status => (status, e.to_string(), None),
            },
            ApiError::RepositoryError(e) => internal("Repository error", &e),
        };

        let mut error_obj = json!({
            "code": status.as_u16(),
            "message": error_message
        });

        if let Some(error_id) = error_id {
            error_obj["error_id"] = json!(error_id);
        }

        (status, Json(json!({ "error": error_obj }))).into_response()
    }
}

fn internal(kind: &str, error: &dyn std::fmt::Display) -> (StatusCode, String, Option<String>) {
    let error_id = Uuid::new_v4();
    tracing::error!(error_id = ?error_id, "{kind}: {error}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
        Some(error_id.to_string()),
    )
}
