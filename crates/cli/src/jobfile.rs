use crate::error::CliError;
use engine_core::settings::EngineSettings;
use model::{
    connector::{Connector, parse_connector, parse_object},
    transform::mapping::{Job, TableGroup},
};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct RawJobFile {
    #[serde(default)]
    settings: EngineSettings,
    #[serde(default)]
    connectors: Vec<serde_json::Value>,
    job: Job,
    #[serde(default, alias = "tableGroups")]
    table_groups: Vec<TableGroup>,
}

/// Everything `syncer run` needs: engine settings, the connectors to register
/// and the job with its table groups.
#[derive(Debug)]
pub struct JobFile {
    pub settings: EngineSettings,
    pub connectors: Vec<Connector>,
    pub job: Job,
    pub table_groups: Vec<TableGroup>,
}

impl JobFile {
    pub fn parse(source: &str) -> Result<Self, CliError> {
        let raw = parse_object::<RawJobFile>(source).map_err(CliError::JobDeserialize)?;
        let connectors = raw
            .connectors
            .iter()
            .map(|value| parse_connector(&value.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            settings: raw.settings.with_env_overrides(),
            connectors,
            job: raw.job,
            table_groups: raw.table_groups,
        })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let source = tokio::fs::read_to_string(path).await?;
        Self::parse(&source)
    }

    /// Progress entry for one table group. A job with several groups keeps
    /// one entry per group so each resumes independently.
    pub fn meta_id_for(&self, group: &TableGroup) -> String {
        if self.table_groups.len() > 1 {
            format!("{}.{}", self.job.meta_id, group.id)
        } else {
            self.job.meta_id.clone()
        }
    }
}
