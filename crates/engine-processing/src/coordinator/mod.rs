//! Orchestrates full and incremental sync for one coordinator instance.
//!
//! Callers must run at most one full-sync loop per meta id at a time; the
//! coordinator reads and rewrites the progress entry without locking it.

mod facade;
mod full;
mod incremental;

use crate::{
    error::SyncError,
    picker::Picker,
    transform::{Plugin, PluginRegistry, TransformPipeline},
    writer::{ParallelBatchWriter, WriteTarget},
};
use connectors::{ConnectorFactory, DataConnector};
use engine_core::{
    audit::AuditSink,
    cache::ProgressCache,
    event_bus::EventBus,
    metrics::{Metrics, MetricsSnapshot},
    pool::WorkerPool,
    settings::EngineSettings,
};
use model::{
    connector::ConnectorConfig,
    progress::meta::Meta,
    transform::mapping::{Job, TableGroup},
};
use std::sync::Arc;
#[cfg(test)]
use std::collections::HashMap;

pub use full::SyncOutcome;

/// Collaborators handed to [`SyncCoordinator::new`].
pub struct CoordinatorDeps {
    pub connectors: ConnectorFactory,
    pub plugins: PluginRegistry,
    pub cache: Arc<dyn ProgressCache>,
    pub audit: Arc<dyn AuditSink>,
    pub events: EventBus,
    pub settings: EngineSettings,
}

pub struct SyncCoordinator {
    connectors: ConnectorFactory,
    plugins: PluginRegistry,
    cache: Arc<dyn ProgressCache>,
    audit: Arc<dyn AuditSink>,
    events: EventBus,
    writer: ParallelBatchWriter,
    metrics: Metrics,
}

/// A table group resolved against its job, ready to process pages or events.
struct Prepared {
    group: TableGroup,
    picker: Picker,
    pipeline: TransformPipeline,
    plugins: Vec<Arc<dyn Plugin>>,
    source: Arc<dyn DataConnector>,
    source_config: ConnectorConfig,
    target: WriteTarget,
}

impl SyncCoordinator {
    pub fn new(deps: CoordinatorDeps) -> Self {
        let metrics = Metrics::new();
        let pool = WorkerPool::new(deps.settings.max_workers);
        let writer =
            ParallelBatchWriter::new(pool, deps.settings.wave_timeout(), metrics.clone());

        Self {
            connectors: deps.connectors,
            plugins: deps.plugins,
            cache: deps.cache,
            audit: deps.audit,
            events: deps.events,
            writer,
            metrics,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn cache(&self) -> &Arc<dyn ProgressCache> {
        &self.cache
    }

    /// Validates the job and group and resolves every collaborator they name.
    /// Nothing is read or written yet.
    async fn prepare(&self, job: &Job, group: &TableGroup) -> Result<Prepared, SyncError> {
        if let Some(tunable) = job.invalid_tunable() {
            return Err(SyncError::InvalidTunable {
                job: job.id.clone(),
                tunable,
            });
        }

        let group = group.merged_with(job);
        let picker = Picker::new(&group)?;
        if group.command.is_empty() {
            return Err(SyncError::EmptyCommand(group.id.clone()));
        }
        let plugins = self.plugins.resolve(&group.plugin)?;
        let pipeline = TransformPipeline::from_rules(&group.convert);

        let source_config = self.connector_config(&job.source_connector_id).await?;
        let target_config = self.connector_config(&job.target_connector_id).await?;
        let source = self.connectors.connector(&source_config)?;
        let target = WriteTarget {
            connector: self.connectors.connector(&target_config)?,
            config: Arc::new(target_config),
            command: Arc::new(group.command.clone()),
            fields: Arc::from(picker.target_fields().to_vec()),
        };

        Ok(Prepared {
            group,
            picker,
            pipeline,
            plugins,
            source,
            source_config,
            target,
        })
    }

    async fn connector_config(&self, connector_id: &str) -> Result<ConnectorConfig, SyncError> {
        self.cache
            .connector(connector_id)
            .await?
            .map(|c| c.config)
            .ok_or_else(|| SyncError::MissingConnector(connector_id.to_string()))
    }

    async fn load_meta(&self, meta_id: &str) -> Result<Meta, SyncError> {
        self.cache
            .meta(meta_id)
            .await?
            .ok_or_else(|| SyncError::MissingMeta(meta_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::memory::MemoryStore;
    use engine_core::{
        audit::{ChannelAuditSink, MemoryAuditStore},
        cache::MemoryProgressCache,
    };
    use model::{
        connector::Connector,
        core::field::Field,
        events::{ChangeEvent, EventKind},
        records::record::Record,
        transform::mapping::{FieldCorrespondence, Table},
    };
    use tokio_util::sync::CancellationToken;

    async fn coordinator() -> (SyncCoordinator, Arc<MemoryProgressCache>) {
        let cache = Arc::new(MemoryProgressCache::new());
        cache
            .put_connector(&Connector::new("src", ConnectorConfig::memory("a")))
            .await
            .unwrap();
        cache
            .put_connector(&Connector::new("dst", ConnectorConfig::memory("b")))
            .await
            .unwrap();
        let (audit, _) = ChannelAuditSink::spawn(Arc::new(MemoryAuditStore::new()), 64);

        let coordinator = SyncCoordinator::new(CoordinatorDeps {
            connectors: ConnectorFactory::with_builtins(MemoryStore::new()),
            plugins: PluginRegistry::new(),
            cache: cache.clone(),
            audit: Arc::new(audit),
            events: EventBus::new(),
            settings: EngineSettings::default(),
        });
        (coordinator, cache)
    }

    fn group() -> TableGroup {
        TableGroup {
            id: "users".into(),
            source_table: Table::named("users"),
            target_table: Table::named("people"),
            field_mapping: vec![FieldCorrespondence {
                source: Some(Field::new("id")),
                target: Some(Field::primary_key("uid")),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn build_command_merges_source_and_target_sides() {
        let (coordinator, _) = coordinator().await;
        let job = Job::new("job", "src", "dst", "meta");

        let command = coordinator.build_command(&job, &group()).await.unwrap();

        assert_eq!(command[connectors::command::SOURCE_TABLE], "users");
        assert_eq!(command[connectors::command::TARGET_TABLE], "people");
        assert_eq!(command[connectors::command::PRIMARY_KEY], "uid");
    }

    #[tokio::test]
    async fn configuration_errors_surface_before_any_work() {
        let (coordinator, cache) = coordinator().await;
        let cancel = CancellationToken::new();
        let job = Job::new("job", "src", "dst", "meta");

        let err = coordinator.full_sync(&job, &group(), &cancel).await.unwrap_err();
        assert!(matches!(err, SyncError::EmptyCommand(_)));

        let mut ready = group();
        ready.command = coordinator.build_command(&job, &ready).await.unwrap();

        let err = coordinator.full_sync(&job, &ready, &cancel).await.unwrap_err();
        assert!(matches!(err, SyncError::MissingMeta(ref id) if id == "meta"));

        let orphan = Job::new("job", "ghost", "dst", "meta");
        let err = coordinator.full_sync(&orphan, &ready, &cancel).await.unwrap_err();
        assert!(matches!(err, SyncError::MissingConnector(ref id) if id == "ghost"));

        let mut plugged = ready.clone();
        plugged.plugin = vec!["nope".into()];
        let err = coordinator
            .incremental_sync(
                &job,
                &plugged,
                ChangeEvent::new("users", EventKind::Insert, Record::new()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownPlugin(_)));

        let zero = Job::new("job", "src", "dst", "meta").with_tunables(100, 0, 10);
        let err = coordinator.full_sync(&zero, &ready, &cancel).await.unwrap_err();
        assert!(err.is_configuration());

        assert!(cache.meta("meta").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn facade_resolves_connectors_through_the_cache() {
        let (coordinator, _) = coordinator().await;
        assert!(coordinator.alive(&ConnectorConfig::memory("a")).await);

        let err = coordinator.meta_info("src", "users").await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Connector(connectors::ConnectorError::TableNotFound(_))
        ));
        assert!(matches!(
            coordinator.count("nobody", &HashMap::new()).await,
            Err(SyncError::MissingConnector(_))
        ));
    }
}
