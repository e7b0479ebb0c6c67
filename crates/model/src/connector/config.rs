use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorType {
    Mysql,
    Postgres,
    JsonFile,
    Memory,
}

impl ConnectorType {
    pub const ALL: [ConnectorType; 4] = [
        ConnectorType::Mysql,
        ConnectorType::Postgres,
        ConnectorType::JsonFile,
        ConnectorType::Memory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::Mysql => "Mysql",
            ConnectorType::Postgres => "Postgres",
            ConnectorType::JsonFile => "JsonFile",
            ConnectorType::Memory => "Memory",
        }
    }
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectorType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
}

/// A directory of `<table>.jsonl` files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub path: PathBuf,
}

/// A named in-process dataset shared by every memory connector instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryConfig {
    pub dataset: String,
}

/// Technology-specific connector configuration, discriminated by
/// `connectorType`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "connectorType")]
pub enum ConnectorConfig {
    Mysql(DatabaseConfig),
    Postgres(DatabaseConfig),
    JsonFile(FileConfig),
    Memory(MemoryConfig),
}

impl ConnectorConfig {
    pub fn connector_type(&self) -> ConnectorType {
        match self {
            ConnectorConfig::Mysql(_) => ConnectorType::Mysql,
            ConnectorConfig::Postgres(_) => ConnectorType::Postgres,
            ConnectorConfig::JsonFile(_) => ConnectorType::JsonFile,
            ConnectorConfig::Memory(_) => ConnectorType::Memory,
        }
    }

    pub fn memory(dataset: impl Into<String>) -> Self {
        ConnectorConfig::Memory(MemoryConfig {
            dataset: dataset.into(),
        })
    }

    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        ConnectorConfig::JsonFile(FileConfig { path: path.into() })
    }
}
