use crate::{
    connector::DataConnector, error::ConnectorError, file::JsonFileConnector,
    memory::{MemoryConnector, MemoryStore},
};
use model::connector::{ConnectorConfig, ConnectorType};
use std::{collections::HashMap, sync::Arc};

/// Resolves the connector implementation for a configuration's technology.
#[derive(Clone, Default)]
pub struct ConnectorFactory {
    connectors: HashMap<ConnectorType, Arc<dyn DataConnector>>,
}

impl ConnectorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the built-in file connector and a memory connector over `store`.
    pub fn with_builtins(store: MemoryStore) -> Self {
        Self::new()
            .register(Arc::new(JsonFileConnector::new()))
            .register(Arc::new(MemoryConnector::new(store)))
    }

    /// Registers `connector` under its own type, replacing any previous one.
    pub fn register(mut self, connector: Arc<dyn DataConnector>) -> Self {
        self.connectors.insert(connector.connector_type(), connector);
        self
    }

    pub fn connector(
        &self,
        config: &ConnectorConfig,
    ) -> Result<Arc<dyn DataConnector>, ConnectorError> {
        let kind = config.connector_type();
        self.connectors
            .get(&kind)
            .cloned()
            .ok_or(ConnectorError::Unsupported(kind))
    }

    pub fn supported(&self) -> Vec<ConnectorType> {
        ConnectorType::ALL
            .into_iter()
            .filter(|t| self.connectors.contains_key(t))
            .collect()
    }
}
