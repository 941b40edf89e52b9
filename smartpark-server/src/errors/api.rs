use super::{AlertError, DeviceError, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    #[error("Alert error: {0}")]
    AlertError(#[from] AlertError),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}
