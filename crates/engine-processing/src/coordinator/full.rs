use super::{Prepared, SyncCoordinator};
use crate::error::SyncError;
use chrono::Utc;
use connectors::ReadRequest;
use model::{
    events::{EventKind, FullSyncCompleted},
    execution::{
        audit::{AuditEntry, LogType, MappingLog, MetaLog},
        write_result::WriteResult,
    },
    progress::meta::{Meta, MetaState, PAGE_INDEX},
    records::record::Record,
    transform::mapping::{Job, TableGroup},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// An empty page was read; cursor state has been cleared.
    Completed {
        pages: u64,
        success: u64,
        failure: u64,
    },
    /// Cancelled at a page boundary; rerunning resumes from `page_index`.
    Aborted { page_index: u64 },
}

impl SyncCoordinator {
    /// Runs a paginated full sync until the source is exhausted or `cancel`
    /// fires. Progress is persisted after every page.
    pub async fn full_sync(
        &self,
        job: &Job,
        group: &TableGroup,
        cancel: &CancellationToken,
    ) -> Result<SyncOutcome, SyncError> {
        let prepared = self.prepare(job, group).await?;
        let meta_id = job.meta_id.as_str();
        let source_table = prepared.group.source_table.name.clone();
        let target_table = prepared.group.target_table.name.clone();

        let mut meta = self.load_meta(meta_id).await?;
        meta.state = MetaState::Running;
        meta.begin_time.get_or_insert_with(Utc::now);
        if !meta.map.contains_key(PAGE_INDEX) {
            let first = meta.page_index();
            meta.set_page_index(first);
        }
        self.cache.put_meta(&meta).await?;

        info!(
            meta_id,
            job_id = %job.id,
            source = %source_table,
            target = %target_table,
            page = meta.page_index(),
            "Full sync started"
        );
        self.audit.async_write(AuditEntry::log(
            LogType::Mapping(MappingLog::Running),
            format!("Full sync started: {source_table} >> {target_table}"),
        ));

        let mut pages = 0u64;
        loop {
            if cancel.is_cancelled() {
                return self.suspend(meta_id).await;
            }

            let mut meta = self.load_meta(meta_id).await?;
            let page_index = meta.page_index();
            let page = prepared
                .source
                .read(
                    &prepared.source_config,
                    ReadRequest {
                        command: &prepared.group.command,
                        filters: &prepared.group.filter,
                        page_index,
                        page_size: job.read_page_size,
                    },
                )
                .await
                .map_err(|source| SyncError::Read {
                    page: page_index,
                    source,
                })?;

            if page.records.is_empty() {
                return self.complete(job, &prepared, meta, pages).await;
            }

            let read = page.records.len();
            let (result, written) = self.process_page(&prepared, job, page.records).await?;
            let summary = result.into_summary();
            meta.record(summary.succeeded(), summary.failed());
            meta.set_page_index(page_index + 1);
            self.cache.put_meta(&meta).await?;

            self.metrics.increment_pages(1);
            self.metrics.increment_written(summary.succeeded());
            self.metrics.increment_failed(summary.failed());

            let success = summary.is_success();
            if success {
                info!(meta_id, page = page_index, rows = read, "Page synced");
            } else {
                error!(
                    meta_id,
                    page = page_index,
                    rows = read,
                    failed = summary.failed(),
                    "Page synced with failures"
                );
            }

            let payload = if success {
                written
            } else {
                summary.failed_records
            };
            self.audit.async_write(AuditEntry::data(
                meta_id,
                EventKind::Insert,
                success,
                payload,
                summary.error,
            ));
            pages += 1;
        }
    }

    /// Picks, converts and writes one page. Returns the merged result, whose
    /// `attempted` equals the page size, plus the records handed to the writer.
    async fn process_page(
        &self,
        prepared: &Prepared,
        job: &Job,
        sources: Vec<Record>,
    ) -> Result<(WriteResult, Vec<Record>), SyncError> {
        let rejected = WriteResult::empty();
        let picked = prepared.picker.pick_all(&sources);

        let mut kept_sources = Vec::with_capacity(sources.len());
        let mut targets = Vec::with_capacity(sources.len());
        for (source, target) in sources.into_iter().zip(picked.records) {
            match prepared.pipeline.apply(target) {
                Ok(converted) => {
                    kept_sources.push(source);
                    targets.push(converted);
                }
                Err(e) => {
                    warn!(error = %e, "Record rejected by conversion");
                    rejected.add_attempted(1);
                    rejected.fail_record(prepared.picker.pick_one(&source), e);
                }
            }
        }

        for plugin in &prepared.plugins {
            if let Err(e) = plugin.convert_batch(&kept_sources, &mut targets) {
                error!(plugin = plugin.id(), error = %e, "Plugin failed for page");
                rejected.add_attempted(targets.len() as u64);
                rejected.fail_records(targets, e);
                return Ok((rejected, Vec::new()));
            }
        }

        let written = targets.clone();
        let result = self
            .writer
            .write(&prepared.target, targets, job.batch_size, job.worker_count)
            .await?;
        result.absorb(rejected);
        Ok((result, written))
    }

    async fn suspend(&self, meta_id: &str) -> Result<SyncOutcome, SyncError> {
        let mut meta = self.load_meta(meta_id).await?;
        meta.state = MetaState::Ready;
        self.cache.put_meta(&meta).await?;

        let page_index = meta.page_index();
        warn!(meta_id, page = page_index, "Full sync suspended");
        self.audit.async_write(AuditEntry::log(
            LogType::Mapping(MappingLog::Stop),
            format!("Full sync suspended at page {page_index}"),
        ));
        Ok(SyncOutcome::Aborted { page_index })
    }

    async fn complete(
        &self,
        job: &Job,
        prepared: &Prepared,
        mut meta: Meta,
        pages: u64,
    ) -> Result<SyncOutcome, SyncError> {
        let end_time = Utc::now();
        meta.clear_cursor();
        meta.state = MetaState::Completed;
        meta.end_time = Some(end_time);
        self.cache.put_meta(&meta).await?;

        info!(
            meta_id = %meta.id,
            pages,
            success = meta.success,
            failure = meta.failure,
            source = %prepared.group.source_table.name,
            target = %prepared.group.target_table.name,
            "Full sync completed"
        );
        self.audit.async_write(AuditEntry::log(
            LogType::Meta(MetaLog::Task),
            format!(
                "Full sync completed: {} >> {}",
                prepared.group.source_table.name, prepared.group.target_table.name
            ),
        ));
        self.events
            .publish(FullSyncCompleted {
                job_id: job.id.clone(),
                meta_id: meta.id.clone(),
                table_group_id: prepared.group.id.clone(),
                success: meta.success,
                failure: meta.failure,
                end_time,
            })
            .await;

        Ok(SyncOutcome::Completed {
            pages,
            success: meta.success,
            failure: meta.failure,
        })
    }
}
