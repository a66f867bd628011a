use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Local storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Failed to open local storage: {0}")]
    StorageOpenFailed(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Remote fetch failed: {0}")]
    RemoteFetchError(String),

    #[error("Remote commit failed: {0}")]
    RemoteCommitError(String),

    #[error("Offline: {0}")]
    Offline(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message suitable for showing to the inspector.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(msg) => msg.clone(),
            AppError::StorageUnavailable(_) | AppError::StorageOpenFailed(_) => {
                "Offline storage is not available on this device; cannot work offline here."
                    .to_string()
            }
            AppError::PersistenceError(_) => {
                "The inspection could not be saved on this device.".to_string()
            }
            AppError::Offline(_) => {
                "You are offline. Connect to the network and try again.".to_string()
            }
            AppError::RemoteFetchError(_) => {
                "Could not download data for offline use. Check your connection.".to_string()
            }
            AppError::RemoteCommitError(_) => {
                "Synchronization failed; pending inspections will be retried.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            AppError::StorageUnavailable(_) | AppError::StorageOpenFailed(_)
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::StorageOpenFailed(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
