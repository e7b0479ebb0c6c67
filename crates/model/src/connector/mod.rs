pub mod config;
pub mod parse;

pub use config::{ConnectorConfig, ConnectorType, DatabaseConfig, FileConfig, MemoryConfig};
pub use parse::{parse_connector, parse_object};

use serde::{Deserialize, Serialize};

/// A registered connector: identity plus its technology-specific config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub config: ConnectorConfig,
}

impl Connector {
    pub fn new(id: impl Into<String>, config: ConnectorConfig) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            config,
        }
    }
}
