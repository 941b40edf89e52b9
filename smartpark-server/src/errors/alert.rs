use axum::http::StatusCode;

use super::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Alert not found")]
    AlertNotFound,

    #[error("Device not found")]
    DeviceNotFound,

    #[error("Alert message must not be empty")]
    EmptyMessage,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AlertError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AlertError::AlertNotFound => StatusCode::NOT_FOUND,
            AlertError::DeviceNotFound => StatusCode::NOT_FOUND,
            AlertError::EmptyMessage => StatusCode::BAD_REQUEST,
            AlertError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
