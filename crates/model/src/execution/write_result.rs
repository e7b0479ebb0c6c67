use crate::records::record::Record;
use std::{
    fmt::Display,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
};

/// Outcome of one or more write attempts.
///
/// Shared between concurrent writers: counters are atomic, the failed-record
/// queue and the error buffer sit behind their own locks. The failure counter
/// is only ever bumped together with a push onto the failed queue, so once
/// writers are done `attempted == succeeded + failed_records.len()`.
#[derive(Debug, Default)]
pub struct WriteResult {
    attempted: AtomicU64,
    fail: AtomicU64,
    fail_data: Mutex<Vec<Record>>,
    error: Mutex<String>,
}

/// Owned snapshot of a finished [`WriteResult`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSummary {
    pub attempted: u64,
    pub failed_records: Vec<Record>,
    pub error: String,
}

impl WriteSummary {
    pub fn failed(&self) -> u64 {
        self.failed_records.len() as u64
    }

    pub fn succeeded(&self) -> u64 {
        self.attempted.saturating_sub(self.failed())
    }

    pub fn is_success(&self) -> bool {
        self.failed_records.is_empty()
    }
}

impl WriteResult {
    pub fn new(attempted: u64) -> Self {
        Self {
            attempted: AtomicU64::new(attempted),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Marks a single record as failed.
    pub fn fail_record(&self, record: Record, error: impl Display) {
        {
            let mut queue = lock(&self.fail_data);
            queue.push(record);
            self.fail.fetch_add(1, Ordering::SeqCst);
        }
        self.append_error(error);
    }

    /// Marks a whole chunk as failed with one error line.
    pub fn fail_records(&self, records: Vec<Record>, error: impl Display) {
        if records.is_empty() {
            return;
        }
        {
            let mut queue = lock(&self.fail_data);
            let n = records.len() as u64;
            queue.extend(records);
            self.fail.fetch_add(n, Ordering::SeqCst);
        }
        self.append_error(error);
    }

    pub fn append_error(&self, error: impl Display) {
        let line = error.to_string();
        if line.is_empty() {
            return;
        }
        let mut buf = lock(&self.error);
        buf.push_str(&line);
        if !line.ends_with('\n') {
            buf.push('\n');
        }
    }

    pub fn add_attempted(&self, n: u64) {
        self.attempted.fetch_add(n, Ordering::SeqCst);
    }

    /// Folds another result into this one.
    pub fn absorb(&self, other: WriteResult) {
        let summary = other.into_summary();
        self.add_attempted(summary.attempted);
        if !summary.failed_records.is_empty() {
            let mut queue = lock(&self.fail_data);
            self.fail
                .fetch_add(summary.failed_records.len() as u64, Ordering::SeqCst);
            queue.extend(summary.failed_records);
        }
        if !summary.error.is_empty() {
            lock(&self.error).push_str(&summary.error);
        }
    }

    pub fn attempted(&self) -> u64 {
        self.attempted.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.fail.load(Ordering::SeqCst)
    }

    pub fn succeeded(&self) -> u64 {
        self.attempted().saturating_sub(self.failed())
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failed_records(&self) -> Vec<Record> {
        lock(&self.fail_data).clone()
    }

    pub fn error_text(&self) -> String {
        lock(&self.error).clone()
    }

    pub fn into_summary(self) -> WriteSummary {
        WriteSummary {
            attempted: self.attempted.into_inner(),
            failed_records: self
                .fail_data
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            error: self
                .error
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        }
    }

    pub fn summary(&self) -> WriteSummary {
        WriteSummary {
            attempted: self.attempted(),
            failed_records: self.failed_records(),
            error: self.error_text(),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn rec(id: i64) -> Record {
        Record::new().with("id", id)
    }

    #[test]
    fn bookkeeping_holds_after_failures() {
        let result = WriteResult::new(10);
        result.fail_record(rec(1), "duplicate key");
        result.fail_records(vec![rec(2), rec(3)], "timeout");

        assert_eq!(result.attempted(), 10);
        assert_eq!(result.failed(), 3);
        assert_eq!(result.succeeded(), 7);
        assert_eq!(result.failed_records().len(), 3);
        assert_eq!(result.error_text(), "duplicate key\ntimeout\n");
    }

    #[test]
    fn absorb_merges_counts_queue_and_errors() {
        let total = WriteResult::empty();
        let a = WriteResult::new(4);
        a.fail_record(rec(1), "bad");
        let b = WriteResult::new(6);

        total.absorb(a);
        total.absorb(b);

        let summary = total.into_summary();
        assert_eq!(summary.attempted, 10);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.succeeded(), 9);
        assert_eq!(summary.error, "bad\n");
    }

    #[test]
    fn concurrent_failures_keep_invariant() {
        let shared = Arc::new(WriteResult::new(800));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        shared.fail_record(rec(t * 100 + i), "x");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(shared.failed(), 200);
        assert_eq!(
            shared.attempted(),
            shared.succeeded() + shared.failed_records().len() as u64
        );
    }
}
