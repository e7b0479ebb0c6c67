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
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

const EXTENSION: &str = "jsonl";

/// Reads and writes tables stored as newline-delimited JSON objects.
///
/// Writes load the table, apply keyed upserts or deletes and replace the file
/// through a temporary sibling. A single lock serialises writers.
#[derive(Debug, Clone, Default)]
pub struct JsonFileConnector {
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn dir<'a>(&self, config: &'a ConnectorConfig) -> Result<&'a Path, ConnectorError> {
        match config {
            ConnectorConfig::JsonFile(cfg) => Ok(cfg.path.as_path()),
            other => Err(ConnectorError::ConfigMismatch {
                expected: ConnectorType::JsonFile,
                actual: other.connector_type(),
            }),
        }
    }

    fn table_path(dir: &Path, table: &str) -> PathBuf {
        dir.join(format!("{table}.{EXTENSION}"))
    }

    async fn load(path: &Path) -> Result<Option<Vec<Record>>, ConnectorError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut rows = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(line).map_err(|e| {
                ConnectorError::Read(format!("{}:{}: {e}", path.display(), line_no + 1))
            })?;
            rows.push(record);
        }
        Ok(Some(rows))
    }

    async fn store(path: &Path, rows: &[Record]) -> Result<(), ConnectorError> {
        let mut out = String::new();
        for row in rows {
            out.push_str(&serde_json::to_string(row)?);
            out.push('\n');
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        fs::write(&tmp, out).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn load_required(path: &Path, table: &str) -> Result<Vec<Record>, ConnectorError> {
        Self::load(path)
            .await?
            .ok_or_else(|| ConnectorError::TableNotFound(table.to_string()))
    }
}

#[async_trait]
impl DataConnector for JsonFileConnector {
    fn connector_type(&self) -> ConnectorType {
        ConnectorType::JsonFile
    }

    async fn is_alive(&self, config: &ConnectorConfig) -> bool {
        match self.dir(config) {
            Ok(dir) => fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn list_tables(&self, config: &ConnectorConfig) -> Result<Vec<String>, ConnectorError> {
        let dir = self.dir(config)?;
        let mut entries = fs::read_dir(dir).await?;
        let mut tables = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    tables.push(stem.to_string());
                }
            }
        }
        tables.sort();
        Ok(tables)
    }

    async fn describe_table(
        &self,
        config: &ConnectorConfig,
        table: &str,
    ) -> Result<MetaInfo, ConnectorError> {
        let path = Self::table_path(self.dir(config)?, table);
        let rows = Self::load_required(&path, table).await?;
        let columns = rows
            .first()
            .map(|r| r.names().map(Field::new).collect())
            .unwrap_or_default();
        Ok(MetaInfo {
            table: table.to_string(),
            columns,
        })
    }

    fn build_command(&self, source: &CommandSpec, target: &CommandSpec) -> HashMap<String, String> {
        command::build(&Ansi, source, target)
    }

    async fn count(
        &self,
        config: &ConnectorConfig,
        command: &HashMap<String, String>,
    ) -> Result<u64, ConnectorError> {
        let table = command::required(command, SOURCE_TABLE)?;
        let path = Self::table_path(self.dir(config)?, table);
        Ok(Self::load_required(&path, table).await?.len() as u64)
    }

    async fn read(
        &self,
        config: &ConnectorConfig,
        request: ReadRequest<'_>,
    ) -> Result<ReadResult, ConnectorError> {
        let table = command::required(request.command, SOURCE_TABLE)?;
        let path = Self::table_path(self.dir(config)?, table);
        let rows = Self::load_required(&path, table).await?;
        let columns = command::columns(request.command, SOURCE_COLUMNS);

        Ok(rows::page(
            &rows,
            request.filters,
            &columns,
            request.page_index,
            request.page_size,
        ))
    }

    async fn write_batch(
        &self,
        config: &ConnectorConfig,
        command: &HashMap<String, String>,
        fields: &[Field],
        records: &[Record],
    ) -> Result<WriteResult, ConnectorError> {
        let table = command::required(command, TARGET_TABLE)?;
        let path = Self::table_path(self.dir(config)?, table);
        let pks = rows::primary_keys(command::columns(command, PRIMARY_KEY), fields);

        let _guard = self.write_lock.lock().await;
        let mut current = Self::load(&path).await?.unwrap_or_default();
        let result = WriteResult::new(records.len() as u64);
        for record in records {
            if let Err(message) = rows::upsert(&mut current, &pks, record.clone()) {
                result.fail_record(record.clone(), message);
            }
        }
        Self::store(&path, &current).await?;

        debug!(
            path = %path.display(),
            written = result.succeeded(),
            failed = result.failed(),
            "File batch written"
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
        let table = command::required(command, TARGET_TABLE)?;
        let path = Self::table_path(self.dir(config)?, table);
        let pks = rows::primary_keys(command::columns(command, PRIMARY_KEY), fields);

        let _guard = self.write_lock.lock().await;
        let mut current = Self::load(&path).await?.unwrap_or_default();
        let outcome = match event {
            EventKind::Insert | EventKind::Update => {
                rows::upsert(&mut current, &pks, record.clone())
            }
            EventKind::Delete => rows::delete(&mut current, &pks, record).map(|removed| {
                if !removed {
                    warn!(path = %path.display(), "Delete matched no row");
                }
            }),
        };

        let result = WriteResult::new(1);
        match outcome {
            Ok(()) => Self::store(&path, &current).await?,
            Err(message) => result.fail_record(record.clone(), message),
        }
        Ok(result)
    }
}
