use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    pages: AtomicU64,
    records_written: AtomicU64,
    records_failed: AtomicU64,
    events: AtomicU64,
    waves: AtomicU64,
}

/// Process-wide sync counters. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub pages: u64,
    pub records_written: u64,
    pub records_failed: u64,
    pub events: u64,
    pub waves: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_pages(&self, count: u64) {
        self.inner.pages.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_written(&self, count: u64) {
        self.inner.records_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_failed(&self, count: u64) {
        self.inner.records_failed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_events(&self, count: u64) {
        self.inner.events.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_waves(&self, count: u64) {
        self.inner.waves.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pages: self.inner.pages.load(Ordering::Relaxed),
            records_written: self.inner.records_written.load(Ordering::Relaxed),
            records_failed: self.inner.records_failed.load(Ordering::Relaxed),
            events: self.inner.events.load(Ordering::Relaxed),
            waves: self.inner.waves.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = Metrics::new();
        let other = metrics.clone();
        metrics.increment_pages(1);
        other.increment_written(40);
        other.increment_failed(2);

        let snap = metrics.snapshot();
        assert_eq!(snap.pages, 1);
        assert_eq!(snap.records_written, 40);
        assert_eq!(snap.records_failed, 2);
        assert_eq!(snap.events, 0);
    }
}
