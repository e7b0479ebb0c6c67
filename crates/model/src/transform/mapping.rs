use crate::{
    core::field::Field,
    transform::{convert::ConvertRule, filter::Filter},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DEFAULT_READ_PAGE_SIZE: usize = 10_000;
const DEFAULT_WORKER_COUNT: usize = 10;
const DEFAULT_BATCH_SIZE: usize = 1_000;

/// One source/target column pair. Either side may be absent, in which case
/// the column is declared on the present side only and carries no value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldCorrespondence {
    #[serde(default)]
    pub source: Option<Field>,
    #[serde(default)]
    pub target: Option<Field>,
}

impl FieldCorrespondence {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: Some(Field::new(source)),
            target: Some(Field::new(target)),
        }
    }

    pub fn source_only(source: Field) -> Self {
        Self {
            source: Some(source),
            target: None,
        }
    }

    pub fn target_only(target: Field) -> Self {
        Self {
            source: None,
            target: Some(target),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Field>,
}

impl Table {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }
}

/// Configuration for one source-table to target-table pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableGroup {
    pub id: String,
    pub source_table: Table,
    pub target_table: Table,
    #[serde(default)]
    pub field_mapping: Vec<FieldCorrespondence>,
    #[serde(default)]
    pub filter: Vec<Filter>,
    #[serde(default)]
    pub convert: Vec<ConvertRule>,
    #[serde(default)]
    pub plugin: Vec<String>,
    /// Connector-specific command, built once per job.
    #[serde(default)]
    pub command: HashMap<String, String>,
}

impl TableGroup {
    /// Effective configuration for a run: job-level filters, conversions and
    /// plugins apply first, followed by the group's own.
    pub fn merged_with(&self, job: &Job) -> TableGroup {
        let mut merged = self.clone();

        merged.filter = job
            .filter
            .iter()
            .chain(self.filter.iter())
            .cloned()
            .collect();
        merged.convert = job
            .convert
            .iter()
            .chain(self.convert.iter())
            .cloned()
            .collect();

        let mut plugins: Vec<String> = Vec::with_capacity(job.plugin.len() + self.plugin.len());
        for id in job.plugin.iter().chain(self.plugin.iter()) {
            if !plugins.contains(id) {
                plugins.push(id.clone());
            }
        }
        merged.plugin = plugins;
        merged
    }
}

/// A configured source-to-target synchronization unit ("mapping").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub source_connector_id: String,
    pub target_connector_id: String,
    pub meta_id: String,
    #[serde(default = "default_read_page_size")]
    pub read_page_size: usize,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub filter: Vec<Filter>,
    #[serde(default)]
    pub convert: Vec<ConvertRule>,
    #[serde(default)]
    pub plugin: Vec<String>,
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        source_connector_id: impl Into<String>,
        target_connector_id: impl Into<String>,
        meta_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            source_connector_id: source_connector_id.into(),
            target_connector_id: target_connector_id.into(),
            meta_id: meta_id.into(),
            read_page_size: DEFAULT_READ_PAGE_SIZE,
            worker_count: DEFAULT_WORKER_COUNT,
            batch_size: DEFAULT_BATCH_SIZE,
            filter: Vec::new(),
            convert: Vec::new(),
            plugin: Vec::new(),
        }
    }

    pub fn with_tunables(mut self, read_page_size: usize, worker_count: usize, batch_size: usize) -> Self {
        self.read_page_size = read_page_size;
        self.worker_count = worker_count;
        self.batch_size = batch_size;
        self
    }

    /// Returns the name of the first tunable that is zero, if any.
    pub fn invalid_tunable(&self) -> Option<&'static str> {
        if self.read_page_size == 0 {
            Some("readPageSize")
        } else if self.worker_count == 0 {
            Some("workerCount")
        } else if self.batch_size == 0 {
            Some("batchSize")
        } else {
            None
        }
    }
}

fn default_read_page_size() -> usize {
    DEFAULT_READ_PAGE_SIZE
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
