use super::SyncCoordinator;
use crate::{error::SyncError, picker::Picker};
use connectors::{CommandSpec, command};
use model::{
    connector::ConnectorConfig,
    core::field::MetaInfo,
    transform::mapping::{Job, TableGroup},
};
use std::collections::HashMap;
use tracing::debug;

impl SyncCoordinator {
    pub async fn alive(&self, config: &ConnectorConfig) -> bool {
        match self.connectors.connector(config) {
            Ok(connector) => connector.is_alive(config).await,
            Err(e) => {
                debug!(error = %e, "No connector for liveness probe");
                false
            }
        }
    }

    pub async fn tables(&self, config: &ConnectorConfig) -> Result<Vec<String>, SyncError> {
        Ok(self.connectors.connector(config)?.list_tables(config).await?)
    }

    pub async fn meta_info(&self, connector_id: &str, table: &str) -> Result<MetaInfo, SyncError> {
        let config = self.connector_config(connector_id).await?;
        Ok(self
            .connectors
            .connector(&config)?
            .describe_table(&config, table)
            .await?)
    }

    pub async fn count(
        &self,
        connector_id: &str,
        command: &HashMap<String, String>,
    ) -> Result<u64, SyncError> {
        let config = self.connector_config(connector_id).await?;
        Ok(self
            .connectors
            .connector(&config)?
            .count(&config, command)
            .await?)
    }

    /// Builds the command for a table group once per job. Read keys come from
    /// the source connector, write keys from the target connector.
    pub async fn build_command(
        &self,
        job: &Job,
        group: &TableGroup,
    ) -> Result<HashMap<String, String>, SyncError> {
        let group = group.merged_with(job);
        let picker = Picker::new(&group)?;

        let source_spec = CommandSpec {
            table: group.source_table.name.clone(),
            columns: picker.source_fields().to_vec(),
            filters: group.filter.clone(),
        };
        let target_spec = CommandSpec {
            table: group.target_table.name.clone(),
            columns: picker.target_fields().to_vec(),
            filters: Vec::new(),
        };

        let source_config = self.connector_config(&job.source_connector_id).await?;
        let target_config = self.connector_config(&job.target_connector_id).await?;
        let source = self.connectors.connector(&source_config)?;
        let target = self.connectors.connector(&target_config)?;

        Ok(command::merge(
            source.build_command(&source_spec, &target_spec),
            target.build_command(&source_spec, &target_spec),
        ))
    }
}
