use connectors::ConnectorError;
use engine_core::error::CacheError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    /// A fail-fast conversion rejected the record.
    #[error("Field '{field}' rejected by {rule} conversion: {reason}")]
    Rejected {
        field: String,
        rule: &'static str,
        reason: String,
    },

    #[error("Plugin '{plugin}' failed: {reason}")]
    Plugin { plugin: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Table group '{0}' has no field mapping")]
    EmptyFieldMapping(String),

    #[error("No progress registered for meta '{0}'")]
    MissingMeta(String),

    #[error("Connector '{0}' is not registered")]
    MissingConnector(String),

    #[error("Table group '{0}' has no command")]
    EmptyCommand(String),

    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),

    #[error("Job '{job}' has an invalid {tunable}: must be greater than zero")]
    InvalidTunable { job: String, tunable: &'static str },

    #[error("Source read failed at page {page}: {source}")]
    Read {
        page: u64,
        #[source]
        source: ConnectorError,
    },

    #[error("Worker pool is closed")]
    PoolClosed,

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl SyncError {
    /// Errors raised before any page or event is processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::EmptyFieldMapping(_)
                | SyncError::MissingMeta(_)
                | SyncError::MissingConnector(_)
                | SyncError::EmptyCommand(_)
                | SyncError::UnknownPlugin(_)
                | SyncError::InvalidTunable { .. }
        )
    }
}
