use axum::http::StatusCode;

use super::{RepositoryError, TelemetryError};

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Telemetry source not set")]
    TelemetrySourceUnset,

    #[error("Device {0} is not controllable")]
    NotControllable(String),

    #[error("Device not found")]
    DeviceNotFound,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("No capacity available")]
    NoCapacity,

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl DeviceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeviceError::TelemetrySourceUnset => StatusCode::CONFLICT,
            DeviceError::NotControllable(_) => StatusCode::CONFLICT,
            DeviceError::DeviceNotFound => StatusCode::NOT_FOUND,
            DeviceError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
            DeviceError::NoCapacity => StatusCode::CONFLICT,
            DeviceError::Telemetry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DeviceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
