use std::env;
use std::sync::Arc;

use tenant_coordinator::metrics::register_custom_metrics;
use tenant_coordinator::metrics::REGISTRY;
use tenant_coordinator::utils::file_io::open_file_for_append;
use tenant_coordinator::Coordinator;
use tenant_coordinator::CoordinatorConfig;
use tenant_coordinator::LoggingConfig;
use tenant_coordinator::MemoryResourceStore;
use tenant_coordinator::Resource;
use tenant_coordinator::ResourcePath;
use tenant_coordinator::ResourceStore;
use tenant_coordinator::Result;
use tenant_coordinator::TenantKind;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = CoordinatorConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.logging)?;
    if let Err(e) = register_custom_metrics(&REGISTRY) {
        warn!("Failed to register metrics: {}", e);
    }

    // Build Store
    let store = MemoryResourceStore::new();
    seed_watchers(&store, TenantKind::Org, "TENANT_ORG_WATCHERS")?;
    seed_watchers(&store, TenantKind::Project, "TENANT_PROJECT_WATCHERS")?;
    store.start();

    // Start Coordinator
    let coordinator = Coordinator::new(Arc::new(store.clone()), settings)?;
    coordinator.register();

    info!("Application started. Waiting for CTRL+C signal...");
    if let Err(e) = graceful_shutdown().await {
        error!("Failed to wait for shutdown signal: {:?}", e);
    }

    coordinator.shutdown();
    store.stop();

    println!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    info!("Shutdown started");
    Ok(())
}

/// Registers the comma-separated watcher names found in `var`, if set.
fn seed_watchers(
    store: &MemoryResourceStore,
    kind: TenantKind,
    var: &str,
) -> Result<()> {
    let Ok(names) = env::var(var) else {
        return Ok(());
    };
    for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let entry = Resource::watcher_entry(ResourcePath::root().child(kind.directory_kind(), name));
        match store.add(entry) {
            Ok(_) => info!(watcher = name, ?kind, "watcher registered"),
            Err(e) if e.is_already_exists() => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

pub fn init_observability(logging: &LoggingConfig) -> Result<WorkerGuard> {
    let log_file = open_file_for_append(&logging.file_path())?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(filter);
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
