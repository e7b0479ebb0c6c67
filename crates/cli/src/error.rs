use engine_core::error::{AuditError, CacheError};
use engine_processing::SyncError;
use model::error::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the job file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to deserialize the job file: {0}")]
    JobDeserialize(ModelError),

    #[error("Invalid connector definition: {0}")]
    Connector(#[from] ModelError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("Progress store error: {0}")]
    Cache(#[from] CacheError),

    #[error("Audit log error: {0}")]
    Audit(#[from] AuditError),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("No progress recorded for meta '{0}'")]
    MetaNotFound(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
