use crate::records::record::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// A trait for events that can be published on the EventBus.
pub trait Event: Send + Sync + Debug + 'static {
    /// Returns a unique identifier for this event type.
    fn event_type(&self) -> &'static str;
}

/// Row-level change kind reported by a CDC producer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Insert,
    Update,
    Delete,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Insert => "INSERT",
            EventKind::Update => "UPDATE",
            EventKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One change notification, consumed once by incremental sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub table: String,
    pub event: EventKind,
    pub data: Record,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, event: EventKind, data: Record) -> Self {
        Self {
            table: table.into(),
            event,
            data,
        }
    }
}

/// Published once when a full sync reads an empty page.
#[derive(Debug, Clone, PartialEq)]
pub struct FullSyncCompleted {
    pub job_id: String,
    pub meta_id: String,
    pub table_group_id: String,
    pub success: u64,
    pub failure: u64,
    pub end_time: DateTime<Utc>,
}

impl Event for FullSyncCompleted {
    fn event_type(&self) -> &'static str {
        "sync.full.completed"
    }
}
