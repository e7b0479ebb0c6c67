use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Expected a JSON object at the top level")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown connector type: {0}")]
    UnknownConnectorType(String),

    #[error("Invalid {connector_type} connector config: {source}")]
    InvalidConfig {
        connector_type: String,
        #[source]
        source: serde_json::Error,
    },
}
