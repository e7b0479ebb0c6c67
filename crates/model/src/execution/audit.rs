use crate::{events::EventKind, records::record::Record};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer, ser::SerializeStruct};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemLog {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorLog {
    Insert,
    Update,
    Delete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingLog {
    Insert,
    Update,
    Delete,
    Running,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableGroupLog {
    Insert,
    Update,
    Delete,
    IncrementFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaLog {
    Delete,
    Clear,
    Task,
}

/// Category and stable code of an operational log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    System(SystemLog),
    Connector(ConnectorLog),
    Mapping(MappingLog),
    TableGroup(TableGroupLog),
    Meta(MetaLog),
}

impl LogType {
    pub fn category(&self) -> &'static str {
        match self {
            LogType::System(_) => "system",
            LogType::Connector(_) => "connector",
            LogType::Mapping(_) => "mapping",
            LogType::TableGroup(_) => "table_group",
            LogType::Meta(_) => "meta",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LogType::System(SystemLog::Info) => "10",
            LogType::System(SystemLog::Warn) => "11",
            LogType::System(SystemLog::Error) => "12",
            LogType::Connector(ConnectorLog::Insert) => "20",
            LogType::Connector(ConnectorLog::Update) => "21",
            LogType::Connector(ConnectorLog::Delete) => "22",
            LogType::Connector(ConnectorLog::Failed) => "23",
            LogType::Mapping(MappingLog::Insert) => "30",
            LogType::Mapping(MappingLog::Update) => "31",
            LogType::Mapping(MappingLog::Delete) => "32",
            LogType::Mapping(MappingLog::Running) => "33",
            LogType::Mapping(MappingLog::Stop) => "34",
            LogType::TableGroup(TableGroupLog::Insert) => "40",
            LogType::TableGroup(TableGroupLog::Update) => "41",
            LogType::TableGroup(TableGroupLog::Delete) => "42",
            LogType::TableGroup(TableGroupLog::IncrementFailed) => "43",
            LogType::Meta(MetaLog::Delete) => "50",
            LogType::Meta(MetaLog::Clear) => "51",
            LogType::Meta(MetaLog::Task) => "52",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LogType::System(SystemLog::Info) => "info",
            LogType::System(SystemLog::Warn) => "warn",
            LogType::System(SystemLog::Error) => "error",
            LogType::Connector(ConnectorLog::Failed) => "connection failed",
            LogType::Mapping(MappingLog::Running) => "started",
            LogType::Mapping(MappingLog::Stop) => "stopped",
            LogType::TableGroup(TableGroupLog::IncrementFailed) => "incremental sync failed",
            LogType::Meta(MetaLog::Clear) => "data cleared",
            LogType::Meta(MetaLog::Task) => "task",
            LogType::Connector(ConnectorLog::Insert)
            | LogType::Mapping(MappingLog::Insert)
            | LogType::TableGroup(TableGroupLog::Insert) => "created",
            LogType::Connector(ConnectorLog::Update)
            | LogType::Mapping(MappingLog::Update)
            | LogType::TableGroup(TableGroupLog::Update) => "updated",
            LogType::Connector(ConnectorLog::Delete)
            | LogType::Mapping(MappingLog::Delete)
            | LogType::TableGroup(TableGroupLog::Delete)
            | LogType::Meta(MetaLog::Delete) => "deleted",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.category(), self.code(), self.label())
    }
}

impl Serialize for LogType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("LogType", 3)?;
        s.serialize_field("category", self.category())?;
        s.serialize_field("code", self.code())?;
        s.serialize_field("label", self.label())?;
        s.end()
    }
}

/// Something handed to the audit sink.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEntry {
    /// Outcome of a page or event write. `records` holds the failed records
    /// when there were failures, otherwise what was written.
    Data {
        meta_id: String,
        event: EventKind,
        success: bool,
        records: Vec<Record>,
        error: String,
        created_at: DateTime<Utc>,
    },
    Log {
        log_type: LogType,
        message: String,
        created_at: DateTime<Utc>,
    },
}

impl AuditEntry {
    pub fn data(
        meta_id: impl Into<String>,
        event: EventKind,
        success: bool,
        records: Vec<Record>,
        error: impl Into<String>,
    ) -> Self {
        AuditEntry::Data {
            meta_id: meta_id.into(),
            event,
            success,
            records,
            error: error.into(),
            created_at: Utc::now(),
        }
    }

    pub fn log(log_type: LogType, message: impl Into<String>) -> Self {
        AuditEntry::Log {
            log_type,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_type_serializes_with_code() {
        let entry = AuditEntry::log(LogType::TableGroup(TableGroupLog::IncrementFailed), "boom");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["log_type"]["code"], "43");
        assert_eq!(json["log_type"]["category"], "table_group");
    }
}
