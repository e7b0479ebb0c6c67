use crate::{
    error::CliError,
    jobfile::JobFile,
    output::{GroupReport, GroupStatus},
    shutdown::ExitStatus,
};
use clap::Parser;
use commands::Commands;
use connectors::{ConnectorFactory, memory::MemoryStore};
use engine_core::{
    audit::{AuditSink, ChannelAuditSink, JsonlAuditStore, MemoryAuditStore},
    cache::{MemoryProgressCache, ProgressCache, SledProgressCache},
    event_bus::EventBus,
    settings::EngineSettings,
};
use engine_processing::{CoordinatorDeps, SyncCoordinator, SyncOutcome, transform::PluginRegistry};
use model::{
    connector::parse_connector,
    events::FullSyncCompleted,
    progress::meta::{Meta, MetaState},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod jobfile;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "syncer",
    version = "0.1.0",
    about = "Heterogeneous database synchronization"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cancel = CancellationToken::new();
    shutdown::cancel_on_signal(cancel.clone());

    let status = match execute(cli.command, &cancel).await {
        Ok(()) => ExitStatus::Success,
        Err(CliError::ShutdownRequested) => {
            warn!("Stopped on request; rerun the same job to resume");
            ExitStatus::Interrupted
        }
        Err(e) => {
            error!(error = %e, "syncer failed");
            ExitStatus::Failed
        }
    };
    status.into()
}

async fn execute(command: Commands, cancel: &CancellationToken) -> Result<(), CliError> {
    match command {
        Commands::Run {
            job,
            state,
            restart,
        } => {
            let state = state_dir(state)?;
            run_job(&job, &state, restart, cancel).await
        }
        Commands::Progress { meta, state, json } => {
            let cache = open_cache(&state_dir(state)?)?;
            let found = cache
                .meta(&meta)
                .await?
                .ok_or_else(|| CliError::MetaNotFound(meta.clone()))?;
            output::print_progress(&found, json)
        }
        Commands::Probe { connector } => probe(&connector).await,
    }
}

fn state_dir(explicit: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match explicit {
        Some(path) => Ok(path),
        None => dirs::home_dir()
            .map(|home| home.join(".syncer/state"))
            .ok_or_else(|| CliError::Unexpected("Could not determine home directory".into())),
    }
}

fn open_cache(state: &Path) -> Result<Arc<dyn ProgressCache>, CliError> {
    let path = state.join("cache");
    let cache = SledProgressCache::open(&path).map_err(|err| {
        CliError::Unexpected(format!(
            "Failed to open progress store at {}: {err}",
            path.display()
        ))
    })?;
    Ok(Arc::new(cache))
}

fn coordinator(
    cache: Arc<dyn ProgressCache>,
    audit: Arc<dyn AuditSink>,
    settings: EngineSettings,
) -> SyncCoordinator {
    SyncCoordinator::new(CoordinatorDeps {
        connectors: ConnectorFactory::with_builtins(MemoryStore::new()),
        plugins: PluginRegistry::new(),
        cache,
        audit,
        events: EventBus::new(),
        settings,
    })
}

async fn run_job(
    path: &Path,
    state: &Path,
    restart: bool,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let file = JobFile::load(path).await?;
    tokio::fs::create_dir_all(state).await?;

    let cache = open_cache(state)?;
    let audit_store = Arc::new(JsonlAuditStore::open(state.join("audit.jsonl")).await?);
    let (audit, audit_task) = ChannelAuditSink::spawn(audit_store, file.settings.audit_buffer);
    for connector in &file.connectors {
        cache.put_connector(connector).await?;
    }

    let coordinator = coordinator(cache.clone(), Arc::new(audit), file.settings.clone());
    let (tx, mut completions) = mpsc::channel(file.settings.event_buffer.max(1));
    coordinator
        .events()
        .subscribe::<FullSyncCompleted>(tx)
        .await;
    tokio::spawn(async move {
        while let Some(done) = completions.recv().await {
            info!(
                meta_id = %done.meta_id,
                table_group = %done.table_group_id,
                success = done.success,
                failure = done.failure,
                "Table group synchronized"
            );
        }
    });

    let mut reports = Vec::with_capacity(file.table_groups.len());
    for group in &file.table_groups {
        let mut job = file.job.clone();
        job.meta_id = file.meta_id_for(group);

        let existing = cache.meta(&job.meta_id).await?;
        match existing {
            Some(meta) if meta.state == MetaState::Completed && !restart => {
                info!(
                    meta_id = %job.meta_id,
                    table_group = %group.id,
                    "Already synchronized, skipping"
                );
                reports.push(GroupReport {
                    group_id: group.id.clone(),
                    meta_id: job.meta_id.clone(),
                    status: GroupStatus::Skipped,
                });
                continue;
            }
            Some(_) if !restart => {}
            _ => cache.put_meta(&Meta::new(job.meta_id.clone())).await?,
        }

        let mut group = group.clone();
        if group.command.is_empty() {
            group.command = coordinator.build_command(&job, &group).await?;
        }

        let outcome = coordinator.full_sync(&job, &group, cancel).await?;
        let stopped = matches!(outcome, SyncOutcome::Aborted { .. });
        reports.push(GroupReport {
            group_id: group.id.clone(),
            meta_id: job.meta_id.clone(),
            status: GroupStatus::Finished(outcome),
        });
        if stopped {
            break;
        }
    }

    let metrics = coordinator.metrics();
    drop(coordinator);
    if let Err(e) = audit_task.await {
        error!(error = %e, "Audit writer did not finish cleanly");
    }

    print!("{}", output::render_run_report(&reports, &metrics));
    if cancel.is_cancelled() {
        return Err(CliError::ShutdownRequested);
    }
    Ok(())
}

async fn probe(path: &Path) -> Result<(), CliError> {
    let source = tokio::fs::read_to_string(path).await?;
    let connector = parse_connector(&source)?;

    let (audit, _) = ChannelAuditSink::spawn(Arc::new(MemoryAuditStore::new()), 1);
    let coordinator = coordinator(
        Arc::new(MemoryProgressCache::new()),
        Arc::new(audit),
        EngineSettings::from_env(),
    );

    if !coordinator.alive(&connector.config).await {
        return Err(CliError::Unexpected(format!(
            "Connector '{}' ({}) is not reachable",
            connector.id,
            connector.config.connector_type()
        )));
    }
    info!(connector = %connector.id, "Connector is reachable");

    for table in coordinator.tables(&connector.config).await? {
        println!("{table}");
    }
    Ok(())
}
