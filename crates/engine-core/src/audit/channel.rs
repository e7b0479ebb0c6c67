use super::{AuditSink, AuditStore};
use model::execution::audit::AuditEntry;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, warn};

/// Audit sink backed by a bounded channel and a background writer task.
///
/// `async_write` never waits: when the channel is full the entry is dropped
/// and counted.
#[derive(Clone)]
pub struct ChannelAuditSink {
    tx: mpsc::Sender<AuditEntry>,
    dropped: Arc<AtomicU64>,
}

impl ChannelAuditSink {
    /// Spawns the writer task. The task ends once every sink clone is dropped
    /// and the queue is drained.
    pub fn spawn(store: Arc<dyn AuditStore>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<AuditEntry>(capacity.max(1));

        let handle = tokio::spawn(async move {
            let mut written = 0u64;
            while let Some(entry) = rx.recv().await {
                match store.append(&entry).await {
                    Ok(()) => written += 1,
                    Err(e) => error!(error = %e, "Failed to persist audit entry"),
                }
            }
            debug!(written, "Audit writer stopped");
        });

        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            handle,
        )
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AuditSink for ChannelAuditSink {
    fn async_write(&self, entry: AuditEntry) {
        if let Err(e) = self.tx.try_send(entry) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(error = %e, "Dropped audit entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditStore;
    use model::{
        events::EventKind,
        execution::audit::{LogType, SystemLog},
        records::record::Record,
    };

    #[tokio::test]
    async fn drains_into_store_after_sinks_drop() {
        let store = MemoryAuditStore::new();
        let (sink, handle) = ChannelAuditSink::spawn(Arc::new(store.clone()), 8);

        sink.async_write(AuditEntry::log(LogType::System(SystemLog::Info), "hello"));
        sink.async_write(AuditEntry::data(
            "meta",
            EventKind::Insert,
            true,
            vec![Record::new().with("id", 1)],
            "",
        ));
        drop(sink);
        handle.await.unwrap();

        assert_eq!(store.entries().len(), 2);
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let store = MemoryAuditStore::new();
        let (sink, _handle) = ChannelAuditSink::spawn(Arc::new(store), 1);

        // The writer task has not been polled yet on the current-thread runtime.
        for _ in 0..5 {
            sink.async_write(AuditEntry::log(LogType::System(SystemLog::Warn), "x"));
        }

        assert!(sink.dropped() >= 1);
    }
}
