use model::connector::ConnectorType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    /// No connector implementation is registered for this technology.
    #[error("Unsupported connector type: {0}")]
    Unsupported(ConnectorType),

    /// A connector was handed another technology's configuration.
    #[error("Connector expected a {expected} config but got {actual}")]
    ConfigMismatch {
        expected: ConnectorType,
        actual: ConnectorType,
    },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Command is missing key: {0}")]
    MissingCommand(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Write failed: {0}")]
    Write(String),
}
