use crate::error::SyncError;
use connectors::DataConnector;
use engine_core::{metrics::Metrics, pool::WorkerPool};
use model::{
    connector::ConnectorConfig, core::field::Field, events::EventKind,
    execution::write_result::WriteResult, records::record::Record,
};
use std::{collections::HashMap, collections::VecDeque, sync::Arc, time::Duration};
use tokio::{
    task::{JoinError, JoinHandle},
    time::Instant,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Everything a write task needs, shareable across spawned tasks.
#[derive(Clone)]
pub struct WriteTarget {
    pub connector: Arc<dyn DataConnector>,
    pub config: Arc<ConnectorConfig>,
    pub command: Arc<HashMap<String, String>>,
    pub fields: Arc<[Field]>,
}

/// Splits a record set into chunks and writes them concurrently in waves.
///
/// Each wave runs at most `min(chunks, worker_count, pool capacity)` tasks,
/// one chunk per task, and waits for all of them (bounded by the wave
/// timeout) before the next wave starts. Failures of one task never affect
/// its siblings: a chunk whose task errors, panics or times out is counted
/// as failed in full. Single-chunk batches and change events skip the pool
/// but get the same timeout and panic handling.
#[derive(Clone)]
pub struct ParallelBatchWriter {
    pool: WorkerPool,
    wave_timeout: Duration,
    metrics: Metrics,
}

impl ParallelBatchWriter {
    pub fn new(pool: WorkerPool, wave_timeout: Duration, metrics: Metrics) -> Self {
        Self {
            pool,
            wave_timeout,
            metrics,
        }
    }

    pub async fn write(
        &self,
        target: &WriteTarget,
        records: Vec<Record>,
        batch_size: usize,
        worker_count: usize,
    ) -> Result<WriteResult, SyncError> {
        let total = records.len();
        if total == 0 {
            return Ok(WriteResult::empty());
        }

        let batch_size = batch_size.max(1);
        if total <= batch_size {
            let chunk = Arc::new(records);
            let handle = tokio::spawn(write_chunk(target.clone(), Arc::clone(&chunk)));
            return Ok(self.settle_inline(handle, &chunk).await);
        }

        let chunk_count = total.div_ceil(batch_size);
        let lease = self
            .pool
            .lease(chunk_count.min(worker_count.max(1)))
            .await
            .ok_or(SyncError::PoolClosed)?;
        let workers = lease.size();
        let batch_id = Uuid::new_v4();

        info!(
            batch_id = %batch_id,
            records = total,
            chunks = chunk_count,
            workers,
            "Writing batch in parallel"
        );

        let mut queue = VecDeque::from(records);
        let result = WriteResult::empty();
        let mut chunks_left = chunk_count;
        let mut wave = 0u64;

        while chunks_left > 0 {
            wave += 1;
            self.run_wave(target, &mut queue, &result, batch_size, workers, batch_id, wave)
                .await;
            self.metrics.increment_waves(1);
            chunks_left = chunks_left.saturating_sub(workers);
        }
        drop(lease);

        info!(
            batch_id = %batch_id,
            attempted = result.attempted(),
            failed = result.failed(),
            waves = wave,
            "Parallel write finished"
        );
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_wave(
        &self,
        target: &WriteTarget,
        queue: &mut VecDeque<Record>,
        result: &WriteResult,
        batch_size: usize,
        workers: usize,
        batch_id: Uuid,
        wave: u64,
    ) {
        let mut tasks = Vec::with_capacity(workers);
        for _ in 0..workers {
            let take = queue.len().min(batch_size);
            if take == 0 {
                break;
            }
            let chunk: Arc<Vec<Record>> = Arc::new(queue.drain(..take).collect());
            let handle = tokio::spawn(write_chunk(target.clone(), Arc::clone(&chunk)));
            tasks.push((chunk, handle));
        }

        let deadline = Instant::now() + self.wave_timeout;
        for (index, (chunk, handle)) in tasks.into_iter().enumerate() {
            match settle(handle, deadline).await {
                Settled::Written(chunk_result) => {
                    debug!(
                        batch_id = %batch_id,
                        wave,
                        chunk = index,
                        records = chunk.len(),
                        failed = chunk_result.failed(),
                        "Chunk written"
                    );
                    result.absorb(chunk_result);
                }
                Settled::Crashed(message) => {
                    error!(batch_id = %batch_id, wave, chunk = index, error = %message, "Write task failed");
                    fail_chunk(result, &chunk, format!("write task failed: {message}"));
                }
                Settled::TimedOut => {
                    warn!(
                        batch_id = %batch_id,
                        wave,
                        chunk = index,
                        timeout_ms = self.wave_timeout.as_millis() as u64,
                        "Write task timed out"
                    );
                    fail_chunk(
                        result,
                        &chunk,
                        format!("write timed out after {:?}", self.wave_timeout),
                    );
                }
            }
        }
    }

    /// Writes a single change event on its own task.
    pub async fn write_event(
        &self,
        target: &WriteTarget,
        fields: Vec<Field>,
        event: EventKind,
        record: Record,
    ) -> WriteResult {
        let handle = tokio::spawn(write_one(target.clone(), fields, event, record.clone()));
        self.settle_inline(handle, std::slice::from_ref(&record)).await
    }

    async fn settle_inline(&self, handle: JoinHandle<WriteResult>, chunk: &[Record]) -> WriteResult {
        let result = WriteResult::empty();
        match settle(handle, Instant::now() + self.wave_timeout).await {
            Settled::Written(written) => result.absorb(written),
            Settled::Crashed(message) => {
                error!(records = chunk.len(), error = %message, "Write task failed");
                fail_chunk(&result, chunk, format!("write task failed: {message}"));
            }
            Settled::TimedOut => {
                warn!(
                    records = chunk.len(),
                    timeout_ms = self.wave_timeout.as_millis() as u64,
                    "Write task timed out"
                );
                fail_chunk(
                    &result,
                    chunk,
                    format!("write timed out after {:?}", self.wave_timeout),
                );
            }
        }
        result
    }
}

enum Settled {
    Written(WriteResult),
    Crashed(String),
    TimedOut,
}

/// Waits for a write task until `deadline`, aborting it once the deadline passes.
async fn settle(mut handle: JoinHandle<WriteResult>, deadline: Instant) -> Settled {
    match tokio::time::timeout_at(deadline, &mut handle).await {
        Ok(Ok(written)) => Settled::Written(written),
        Ok(Err(join_error)) => Settled::Crashed(panic_message(join_error)),
        Err(_) => {
            handle.abort();
            Settled::TimedOut
        }
    }
}

async fn write_one(
    target: WriteTarget,
    fields: Vec<Field>,
    event: EventKind,
    record: Record,
) -> WriteResult {
    let outcome = target
        .connector
        .write_one(&target.config, &fields, &target.command, event, &record)
        .await;
    match outcome {
        Ok(written) => normalize(1, written),
        Err(e) => {
            let failed = WriteResult::new(1);
            failed.fail_record(record, e);
            failed
        }
    }
}

/// Writes one chunk. An `Err` from the connector fails the whole chunk.
async fn write_chunk(target: WriteTarget, chunk: Arc<Vec<Record>>) -> WriteResult {
    match target
        .connector
        .write_batch(&target.config, &target.command, &target.fields, &chunk)
        .await
    {
        Ok(written) => normalize(chunk.len(), written),
        Err(e) => {
            error!(records = chunk.len(), error = %e, "Chunk write failed");
            let failed = WriteResult::new(chunk.len() as u64);
            failed.fail_records(chunk.to_vec(), e);
            failed
        }
    }
}

/// Pins `attempted` to the chunk size whatever the connector reported.
fn normalize(len: usize, written: WriteResult) -> WriteResult {
    let summary = written.into_summary();
    let result = WriteResult::new(len as u64);
    result.fail_records(summary.failed_records, "");
    result.append_error(summary.error);
    result
}

fn fail_chunk(result: &WriteResult, chunk: &[Record], message: String) {
    result.add_attempted(chunk.len() as u64);
    result.fail_records(chunk.to_vec(), message);
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}
