//! Fire-and-forget audit trail for written data and operational logs.

use crate::error::AuditError;
use async_trait::async_trait;
use model::execution::audit::AuditEntry;

pub mod channel;
pub mod jsonl;
pub mod memory;

pub use channel::ChannelAuditSink;
pub use jsonl::JsonlAuditStore;
pub use memory::MemoryAuditStore;

/// Non-blocking hand-off point used by the coordinator.
pub trait AuditSink: Send + Sync {
    /// Queues `entry` without waiting for it to be persisted.
    fn async_write(&self, entry: AuditEntry);
}

/// Where a [`ChannelAuditSink`] eventually persists entries.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError>;
}
