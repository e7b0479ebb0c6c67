use super::{META_ID, SOURCE_CONNECTOR, SOURCE_DATASET, TARGET_CONNECTOR, TARGET_DATASET};
use connectors::{
    ConnectorFactory,
    file::JsonFileConnector,
    memory::{MemoryConnector, MemoryStore},
};
use engine_core::{
    audit::{ChannelAuditSink, MemoryAuditStore},
    cache::{MemoryProgressCache, ProgressCache},
    event_bus::EventBus,
    settings::EngineSettings,
};
use engine_processing::{CoordinatorDeps, SyncCoordinator, SyncOutcome, transform::PluginRegistry};
use model::{
    connector::{Connector, ConnectorConfig},
    core::{field::Field, value::Value},
    execution::audit::AuditEntry,
    progress::meta::Meta,
    records::record::Record,
    transform::mapping::{FieldCorrespondence, Job, Table, TableGroup},
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A coordinator wired to in-memory collaborators, plus handles to inspect them.
pub struct Harness {
    pub store: MemoryStore,
    pub connector: MemoryConnector,
    pub cache: Arc<dyn ProgressCache>,
    pub coordinator: SyncCoordinator,
    audit_store: Arc<MemoryAuditStore>,
    audit_task: JoinHandle<()>,
}

impl Harness {
    pub async fn new(connector: MemoryConnector) -> Self {
        Self::build(
            connector,
            Arc::new(MemoryProgressCache::new()),
            PluginRegistry::new(),
        )
        .await
    }

    pub async fn with_plugins(connector: MemoryConnector, plugins: PluginRegistry) -> Self {
        Self::build(connector, Arc::new(MemoryProgressCache::new()), plugins).await
    }

    pub async fn with_cache(connector: MemoryConnector, cache: Arc<dyn ProgressCache>) -> Self {
        Self::build(connector, cache, PluginRegistry::new()).await
    }

    async fn build(
        connector: MemoryConnector,
        cache: Arc<dyn ProgressCache>,
        plugins: PluginRegistry,
    ) -> Self {
        for (id, dataset) in [
            (SOURCE_CONNECTOR, SOURCE_DATASET),
            (TARGET_CONNECTOR, TARGET_DATASET),
        ] {
            cache
                .put_connector(&Connector::new(id, ConnectorConfig::memory(dataset)))
                .await
                .expect("register connector");
        }

        let audit_store = Arc::new(MemoryAuditStore::new());
        let (audit, audit_task) = ChannelAuditSink::spawn(audit_store.clone(), 1024);

        let coordinator = SyncCoordinator::new(CoordinatorDeps {
            connectors: ConnectorFactory::new()
                .register(Arc::new(connector.clone()))
                .register(Arc::new(JsonFileConnector::new())),
            plugins,
            cache: cache.clone(),
            audit: Arc::new(audit),
            events: EventBus::new(),
            settings: EngineSettings::default(),
        });

        Self {
            store: connector.store().clone(),
            connector,
            cache,
            coordinator,
            audit_store,
            audit_task,
        }
    }

    /// Builds the group's command and registers a fresh progress entry.
    pub async fn prepare(&self, job: &Job, mut group: TableGroup) -> TableGroup {
        group.command = self
            .coordinator
            .build_command(job, &group)
            .await
            .expect("build command");
        if self.cache.meta(&job.meta_id).await.expect("read meta").is_none() {
            self.cache
                .put_meta(&Meta::new(job.meta_id.clone()))
                .await
                .expect("register meta");
        }
        group
    }

    pub async fn run(&self, job: &Job, group: &TableGroup) -> SyncOutcome {
        self.coordinator
            .full_sync(job, group, &CancellationToken::new())
            .await
            .expect("full sync")
    }

    pub async fn meta(&self) -> Meta {
        self.cache
            .meta(META_ID)
            .await
            .expect("read meta")
            .expect("meta registered")
    }

    pub fn target_rows(&self) -> Vec<Record> {
        self.store.rows(TARGET_DATASET, "people")
    }

    /// Stops the coordinator and returns every audit entry it produced.
    pub async fn audit(self) -> Vec<AuditEntry> {
        let Harness {
            coordinator,
            audit_store,
            audit_task,
            ..
        } = self;
        drop(coordinator);
        audit_task.await.expect("audit writer");
        audit_store.entries()
    }
}

pub fn job(read_page_size: usize, worker_count: usize, batch_size: usize) -> Job {
    Job::new("sync-users", SOURCE_CONNECTOR, TARGET_CONNECTOR, META_ID).with_tunables(
        read_page_size,
        worker_count,
        batch_size,
    )
}

/// `users(id, name, email)` mapped onto `people(uid, full_name, email)`.
pub fn users_group() -> TableGroup {
    TableGroup {
        id: "users-to-people".into(),
        source_table: Table::named("users"),
        target_table: Table::named("people"),
        field_mapping: vec![
            FieldCorrespondence {
                source: Some(Field::primary_key("id")),
                target: Some(Field::primary_key("uid")),
            },
            FieldCorrespondence::new("name", "full_name"),
            FieldCorrespondence::new("email", "email"),
        ],
        ..Default::default()
    }
}

pub fn user(id: i64) -> Record {
    Record::new()
        .with("id", id)
        .with("name", format!("user-{id}"))
        .with("email", format!("user{id}@example.com"))
}

/// Seeds `users` with ids `1..=count`.
pub fn seed_users(store: &MemoryStore, count: i64) {
    store.define_table(
        SOURCE_DATASET,
        "users",
        vec![Field::primary_key("id"), Field::new("name"), Field::new("email")],
    );
    store.insert_rows(SOURCE_DATASET, "users", (1..=count).map(user));
}

pub fn uid(record: &Record) -> Option<i64> {
    match record.get("uid") {
        Some(Value::Int(id)) => Some(*id),
        _ => None,
    }
}

pub fn sorted_uids(records: &[Record]) -> Vec<i64> {
    let mut ids: Vec<i64> = records.iter().filter_map(uid).collect();
    ids.sort_unstable();
    ids
}
