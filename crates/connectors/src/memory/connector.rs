use super::store::MemoryStore;
use crate::{
    command::{self, Ansi, PRIMARY_KEY, SOURCE_COLUMNS, SOURCE_TABLE, TARGET_TABLE},
    connector::{CommandSpec, DataConnector, ReadRequest, ReadResult},
    error::ConnectorError,
    rows,
};
use async_trait::async_trait;
use model::{
    connector::{ConnectorConfig, ConnectorType},
    core::field::{Field, MetaInfo},
    events::EventKind,
    execution::write_result::WriteResult,
    records::record::Record,
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tracing::debug;

type RecordFault = Arc<dyn Fn(&Record) -> Option<String> + Send + Sync>;
type ChunkFault = Arc<dyn Fn(&[Record]) -> Option<String> + Send + Sync>;
type ReadHook = Arc<dyn Fn(u64) + Send + Sync>;

/// Connector over a [`MemoryStore`].
///
/// Besides serving as a lightweight target, it carries hooks to inject write
/// failures and latency and it records which pages were read.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    store: MemoryStore,
    record_fault: Option<RecordFault>,
    chunk_fault: Option<ChunkFault>,
    read_hook: Option<ReadHook>,
    write_delay: Option<Duration>,
    pages_read: Arc<Mutex<Vec<u64>>>,
    write_calls: Arc<AtomicU64>,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            ..Default::default()
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Fails every record for which `fault` returns an error message.
    pub fn with_record_fault(
        mut self,
        fault: impl Fn(&Record) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.record_fault = Some(Arc::new(fault));
        self
    }

    /// Rejects a whole chunk with `Err` when `fault` returns a message.
    pub fn with_chunk_fault(
        mut self,
        fault: impl Fn(&[Record]) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.chunk_fault = Some(Arc::new(fault));
        self
    }

    /// Called with the page index before every read.
    pub fn with_read_hook(mut self, hook: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.read_hook = Some(Arc::new(hook));
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Page indexes requested so far, in order.
    pub fn pages_read(&self) -> Vec<u64> {
        self.pages_read
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of `write_batch` calls received.
    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn dataset<'a>(&self, config: &'a ConnectorConfig) -> Result<&'a str, ConnectorError> {
        match config {
            ConnectorConfig::Memory(cfg) => Ok(cfg.dataset.as_str()),
            other => Err(ConnectorError::ConfigMismatch {
                expected: ConnectorType::Memory,
                actual: other.connector_type(),
            }),
        }
    }

    fn faults_for(&self, records: &[Record]) -> Vec<Option<String>> {
        records
            .iter()
            .map(|r| self.record_fault.as_ref().and_then(|f| f(r)))
            .collect()
    }
}

#[async_trait]
impl DataConnector for MemoryConnector {
    fn connector_type(&self) -> ConnectorType {
        ConnectorType::Memory
    }

    async fn is_alive(&self, config: &ConnectorConfig) -> bool {
        self.dataset(config).is_ok()
    }

    async fn list_tables(&self, config: &ConnectorConfig) -> Result<Vec<String>, ConnectorError> {
        Ok(self.store.table_names(self.dataset(config)?))
    }

    async fn describe_table(
        &self,
        config: &ConnectorConfig,
        table: &str,
    ) -> Result<MetaInfo, ConnectorError> {
        let dataset = self.dataset(config)?;
        self.store
            .with_table(dataset, table, |t| {
                let columns = if t.columns.is_empty() {
                    t.rows
                        .first()
                        .map(|r| r.names().map(Field::new).collect())
                        .unwrap_or_default()
                } else {
                    t.columns.clone()
                };
                MetaInfo {
                    table: table.to_string(),
                    columns,
                }
            })
            .ok_or_else(|| ConnectorError::TableNotFound(table.to_string()))
    }

    fn build_command(&self, source: &CommandSpec, target: &CommandSpec) -> HashMap<String, String> {
        command::build(&Ansi, source, target)
    }

    async fn count(
        &self,
        config: &ConnectorConfig,
        command: &HashMap<String, String>,
    ) -> Result<u64, ConnectorError> {
        let dataset = self.dataset(config)?;
        let table = command::required(command, SOURCE_TABLE)?;
        self.store
            .with_table(dataset, table, |t| t.rows.len() as u64)
            .ok_or_else(|| ConnectorError::TableNotFound(table.to_string()))
    }

    async fn read(
        &self,
        config: &ConnectorConfig,
        request: ReadRequest<'_>,
    ) -> Result<ReadResult, ConnectorError> {
        let dataset = self.dataset(config)?;
        let table = command::required(request.command, SOURCE_TABLE)?;

        self.pages_read
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.page_index);
        if let Some(hook) = &self.read_hook {
            hook(request.page_index);
        }

        let columns = command::columns(request.command, SOURCE_COLUMNS);
        self.store
            .with_table(dataset, table, |t| {
                rows::page(
                    &t.rows,
                    request.filters,
                    &columns,
                    request.page_index,
                    request.page_size,
                )
            })
            .ok_or_else(|| ConnectorError::TableNotFound(table.to_string()))
    }

    async fn write_batch(
        &self,
        config: &ConnectorConfig,
        command: &HashMap<String, String>,
        fields: &[Field],
        records: &[Record],
    ) -> Result<WriteResult, ConnectorError> {
        let dataset = self.dataset(config)?;
        let table = command::required(command, TARGET_TABLE)?;
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.chunk_fault.as_ref().and_then(|f| f(records)) {
            return Err(ConnectorError::Write(message));
        }

        let pks = rows::primary_keys(command::columns(command, PRIMARY_KEY), fields);
        let faults = self.faults_for(records);
        let result = WriteResult::new(records.len() as u64);

        self.store.with_table_mut(dataset, table, |t| {
            if t.columns.is_empty() {
                t.columns = fields.to_vec();
            }
            for (record, fault) in records.iter().zip(faults) {
                let outcome = match fault {
                    Some(message) => Err(message),
                    None => rows::upsert(&mut t.rows, &pks, record.clone()),
                };
                if let Err(message) = outcome {
                    result.fail_record(record.clone(), message);
                }
            }
        });

        debug!(
            table,
            written = result.succeeded(),
            failed = result.failed(),
            "Memory batch written"
        );
        Ok(result)
    }

    async fn write_one(
        &self,
        config: &ConnectorConfig,
        fields: &[Field],
        command: &HashMap<String, String>,
        event: EventKind,
        record: &Record,
    ) -> Result<WriteResult, ConnectorError> {
        let dataset = self.dataset(config)?;
        let table = command::required(command, TARGET_TABLE)?;
        let pks = rows::primary_keys(command::columns(command, PRIMARY_KEY), fields);
        let result = WriteResult::new(1);

        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.record_fault.as_ref().and_then(|f| f(record)) {
            result.fail_record(record.clone(), message);
            return Ok(result);
        }

        let outcome = self.store.with_table_mut(dataset, table, |t| match event {
            EventKind::Insert | EventKind::Update => rows::upsert(&mut t.rows, &pks, record.clone()),
            EventKind::Delete => rows::delete(&mut t.rows, &pks, record).map(|removed| {
                if !removed {
                    debug!(table, "Delete matched no row");
                }
            }),
        });
        if let Err(message) = outcome {
            result.fail_record(record.clone(), message);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::Value;

    fn command() -> HashMap<String, String> {
        let source = CommandSpec {
            table: "src".into(),
            columns: vec![Field::new("id"), Field::new("name")],
            filters: vec![],
        };
        let target = CommandSpec {
            table: "dst".into(),
            columns: vec![Field::primary_key("id"), Field::new("name")],
            filters: vec![],
        };
        MemoryConnector::default().build_command(&source, &target)
    }

    fn seeded(n: i64) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_rows(
            "ds",
            "src",
            (1..=n).map(|i| Record::new().with("id", i).with("name", format!("user-{i}"))),
        );
        store
    }

    #[tokio::test]
    async fn reads_pages_and_logs_them() {
        let connector = MemoryConnector::new(seeded(15));
        let config = ConnectorConfig::memory("ds");
        let command = command();

        let first = connector
            .read(
                &config,
                ReadRequest {
                    command: &command,
                    filters: &[],
                    page_index: 1,
                    page_size: 10,
                },
            )
            .await
            .unwrap();
        let second = connector
            .read(
                &config,
                ReadRequest {
                    command: &command,
                    filters: &[],
                    page_index: 2,
                    page_size: 10,
                },
            )
            .await
            .unwrap();

        assert_eq!(first.records.len(), 10);
        assert_eq!(second.records.len(), 5);
        assert_eq!(connector.pages_read(), vec![1, 2]);
        assert_eq!(connector.count(&config, &command).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn record_fault_fails_only_matching_rows() {
        let store = MemoryStore::new();
        let connector = MemoryConnector::new(store.clone()).with_record_fault(|r| {
            (r.get("id") == Some(&Value::Int(2))).then(|| "constraint violated".to_string())
        });
        let records: Vec<Record> = (1..=3).map(|i| Record::new().with("id", i)).collect();

        let result = connector
            .write_batch(
                &ConnectorConfig::memory("ds"),
                &command(),
                &[Field::primary_key("id")],
                &records,
            )
            .await
            .unwrap();

        assert_eq!(result.attempted(), 3);
        assert_eq!(result.failed(), 1);
        assert_eq!(store.rows("ds", "dst").len(), 2);
        assert_eq!(connector.write_calls(), 1);
    }

    #[tokio::test]
    async fn chunk_fault_returns_err() {
        let connector =
            MemoryConnector::default().with_chunk_fault(|_| Some("connection reset".to_string()));
        let err = connector
            .write_batch(
                &ConnectorConfig::memory("ds"),
                &command(),
                &[],
                &[Record::new().with("id", 1)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Write(_)));
    }

    #[tokio::test]
    async fn delete_event_removes_by_key() {
        let store = MemoryStore::new();
        store.insert_rows("ds", "dst", [Record::new().with("id", 9).with("name", "x")]);
        let connector = MemoryConnector::new(store.clone());

        let result = connector
            .write_one(
                &ConnectorConfig::memory("ds"),
                &[Field::primary_key("id")],
                &command(),
                EventKind::Delete,
                &Record::new().with("id", 9),
            )
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(store.rows("ds", "dst").is_empty());
    }

    #[tokio::test]
    async fn rejects_foreign_config() {
        let connector = MemoryConnector::default();
        assert!(!connector.is_alive(&ConnectorConfig::json_file("/tmp")).await);
        assert!(matches!(
            connector.list_tables(&ConnectorConfig::json_file("/tmp")).await,
            Err(ConnectorError::ConfigMismatch { .. })
        ));
    }
}
