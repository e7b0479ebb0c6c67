use crate::error::ConnectorError;
use async_trait::async_trait;
use model::{
    connector::{ConnectorConfig, ConnectorType},
    core::field::{Field, MetaInfo},
    events::EventKind,
    execution::write_result::WriteResult,
    records::record::Record,
    transform::filter::Filter,
};
use std::collections::HashMap;

/// One side of a command: the table and the columns a job touches on it.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub table: String,
    pub columns: Vec<Field>,
    pub filters: Vec<Filter>,
}

impl CommandSpec {
    pub fn primary_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.pk)
            .map(|c| c.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadRequest<'a> {
    pub command: &'a HashMap<String, String>,
    pub filters: &'a [Filter],
    /// 1-based page number.
    pub page_index: u64,
    pub page_size: usize,
}

#[derive(Debug, Default)]
pub struct ReadResult {
    pub records: Vec<Record>,
    /// Rows the connector examined to build this page, before filtering.
    pub scanned: u64,
}

/// Capability interface every backing technology implements.
///
/// Writes are expected to be keyed upserts so that re-writing a page after a
/// resume does not duplicate data.
#[async_trait]
pub trait DataConnector: Send + Sync {
    fn connector_type(&self) -> ConnectorType;

    async fn is_alive(&self, config: &ConnectorConfig) -> bool;

    async fn list_tables(&self, config: &ConnectorConfig) -> Result<Vec<String>, ConnectorError>;

    async fn describe_table(
        &self,
        config: &ConnectorConfig,
        table: &str,
    ) -> Result<MetaInfo, ConnectorError>;

    /// Builds the connector-specific command once per job.
    fn build_command(&self, source: &CommandSpec, target: &CommandSpec) -> HashMap<String, String>;

    async fn count(
        &self,
        config: &ConnectorConfig,
        command: &HashMap<String, String>,
    ) -> Result<u64, ConnectorError>;

    async fn read(
        &self,
        config: &ConnectorConfig,
        request: ReadRequest<'_>,
    ) -> Result<ReadResult, ConnectorError>;

    /// Writes a chunk. Per-record failures are reported in the returned
    /// result; an `Err` means the whole chunk is unaccounted for.
    async fn write_batch(
        &self,
        config: &ConnectorConfig,
        command: &HashMap<String, String>,
        fields: &[Field],
        records: &[Record],
    ) -> Result<WriteResult, ConnectorError>;

    async fn write_one(
        &self,
        config: &ConnectorConfig,
        fields: &[Field],
        command: &HashMap<String, String>,
        event: EventKind,
        record: &Record,
    ) -> Result<WriteResult, ConnectorError>;
}
