use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cursor key holding the next page to read.
pub const PAGE_INDEX: &str = "pageIndex";
pub const DEFAULT_PAGE_INDEX: u64 = 1;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum MetaState {
    #[default]
    Ready,
    Running,
    Completed,
}

/// Persisted, resumable state of a job: success/failure counters plus an open
/// cursor map owned by the connectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    pub id: String,
    pub state: MetaState,
    pub success: u64,
    pub failure: u64,
    pub map: HashMap<String, String>,
    pub begin_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Meta {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Next page to read. A missing or garbled entry falls back to the first page.
    pub fn page_index(&self) -> u64 {
        self.map
            .get(PAGE_INDEX)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v >= DEFAULT_PAGE_INDEX)
            .unwrap_or(DEFAULT_PAGE_INDEX)
    }

    pub fn set_page_index(&mut self, page: u64) {
        self.map.insert(PAGE_INDEX.to_string(), page.to_string());
    }

    /// Drops all cursor state, including the page index.
    pub fn clear_cursor(&mut self) {
        self.map.clear();
    }

    pub fn record(&mut self, succeeded: u64, failed: u64) {
        self.success = self.success.saturating_add(succeeded);
        self.failure = self.failure.saturating_add(failed);
    }

    pub fn total(&self) -> u64 {
        self.success.saturating_add(self.failure)
    }
}
