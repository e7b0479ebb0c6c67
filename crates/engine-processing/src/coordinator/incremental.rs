use super::{Prepared, SyncCoordinator};
use crate::error::SyncError;
use model::{
    events::ChangeEvent,
    execution::{
        audit::{AuditEntry, LogType, TableGroupLog},
        write_result::{WriteResult, WriteSummary},
    },
    transform::mapping::{Job, TableGroup},
};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

impl SyncCoordinator {
    /// Applies one change event through the picker, conversions and plugins
    /// and writes it as a single record. Only the counters of the job's
    /// progress entry change.
    pub async fn incremental_sync(
        &self,
        job: &Job,
        group: &TableGroup,
        event: ChangeEvent,
    ) -> Result<WriteSummary, SyncError> {
        let prepared = self.prepare(job, group).await?;
        self.apply_event(job, &prepared, event).await
    }

    /// Consumes change events until the channel closes or `cancel` fires,
    /// routing each one by source table. Returns how many events were applied.
    pub async fn listen(
        &self,
        job: &Job,
        groups: &[TableGroup],
        mut events: mpsc::Receiver<ChangeEvent>,
        cancel: &CancellationToken,
    ) -> Result<u64, SyncError> {
        let mut routes: HashMap<String, Prepared> = HashMap::with_capacity(groups.len());
        for group in groups {
            let prepared = self.prepare(job, group).await?;
            routes.insert(prepared.group.source_table.name.clone(), prepared);
        }
        // Fail on a missing progress entry before the first event arrives.
        self.load_meta(&job.meta_id).await?;

        info!(job_id = %job.id, tables = routes.len(), "Listening for change events");
        let mut applied = 0u64;
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(job_id = %job.id, applied, "Change listener cancelled");
                    break;
                }
                event = events.recv() => event,
            };
            let Some(event) = event else {
                debug!(job_id = %job.id, applied, "Change event channel closed");
                break;
            };

            match routes.get(&event.table) {
                Some(prepared) => {
                    self.apply_event(job, prepared, event).await?;
                    applied += 1;
                }
                None => warn!(table = %event.table, "No table group for change event"),
            }
        }
        Ok(applied)
    }

    async fn apply_event(
        &self,
        job: &Job,
        prepared: &Prepared,
        event: ChangeEvent,
    ) -> Result<WriteSummary, SyncError> {
        let mut meta = self.load_meta(&job.meta_id).await?;
        let picked = prepared.picker.pick(&event.data);

        let converted = prepared
            .pipeline
            .apply(picked.record.clone())
            .and_then(|mut target| {
                for plugin in &prepared.plugins {
                    plugin.convert_event(event.event, &event.data, &mut target)?;
                }
                Ok(target)
            });

        let (result, written) = match converted {
            Ok(target) => {
                let result = self
                    .writer
                    .write_event(
                        &prepared.target,
                        picked.target_fields.clone(),
                        event.event,
                        target.clone(),
                    )
                    .await;
                (result, Some(target))
            }
            Err(e) => {
                let failed = WriteResult::new(1);
                failed.fail_record(picked.record, e);
                (failed, None)
            }
        };

        let summary = result.into_summary();
        meta.record(summary.succeeded(), summary.failed());
        self.cache.put_meta(&meta).await?;
        self.metrics.increment_events(1);
        self.metrics.increment_written(summary.succeeded());
        self.metrics.increment_failed(summary.failed());

        let success = summary.is_success();
        if !success {
            error!(
                meta_id = %meta.id,
                table = %event.table,
                event = %event.event,
                error = %summary.error.trim_end(),
                "Change event write failed"
            );
            self.audit.async_write(AuditEntry::log(
                LogType::TableGroup(TableGroupLog::IncrementFailed),
                format!(
                    "{} on {} failed: {}",
                    event.event,
                    prepared.group.target_table.name,
                    summary.error.trim_end()
                ),
            ));
        }
        let payload = if success {
            written.into_iter().collect()
        } else {
            summary.failed_records.clone()
        };
        self.audit.async_write(AuditEntry::data(
            meta.id.clone(),
            event.event,
            success,
            payload,
            summary.error.clone(),
        ));

        Ok(summary)
    }
}
