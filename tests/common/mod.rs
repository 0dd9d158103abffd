use std::sync::Arc;
use std::time::Duration;

use tenant_coordinator::ActiveWatcherBody;
use tenant_coordinator::Coordinator;
use tenant_coordinator::CoordinatorConfig;
use tenant_coordinator::LifecycleConfig;
use tenant_coordinator::MemoryResourceStore;
use tenant_coordinator::Resource;
use tenant_coordinator::ResourceBody;
use tenant_coordinator::ResourcePath;
use tenant_coordinator::ResourceStore;
use tenant_coordinator::StatusIndicator;
use tenant_coordinator::TenantKind;
use tenant_coordinator::WatcherIndicator;
use tenant_coordinator::WatcherStatus;
use tenant_coordinator::DEFAULT_FOLDER;

/// Deadline used by every scenario, matching the documented examples
pub const DEADLINE_IN_SECS: u64 = 8;

pub struct TestContext {
    pub store: MemoryResourceStore,
    pub coordinator: Arc<Coordinator>,
}

pub fn scenario_config() -> CoordinatorConfig {
    CoordinatorConfig {
        lifecycle: LifecycleConfig {
            org_create_timeout_in_secs: DEADLINE_IN_SECS,
            org_delete_timeout_in_secs: DEADLINE_IN_SECS,
            project_create_timeout_in_secs: DEADLINE_IN_SECS,
            project_delete_timeout_in_secs: DEADLINE_IN_SECS,
        },
        test_mode: true,
        ..Default::default()
    }
}

impl TestContext {
    pub fn start(
        org_watchers: &[&str],
        project_watchers: &[&str],
    ) -> Self {
        let store = MemoryResourceStore::new();
        for (kind, names) in [
            (TenantKind::Org, org_watchers),
            (TenantKind::Project, project_watchers),
        ] {
            for name in names {
                store
                    .add(Resource::watcher_entry(
                        ResourcePath::root().child(kind.directory_kind(), *name),
                    ))
                    .unwrap();
            }
        }
        store.start();

        let coordinator = Coordinator::new(Arc::new(store.clone()), scenario_config()).unwrap();
        coordinator.register();
        Self { store, coordinator }
    }

    pub async fn settle(&self) {
        self.store.wait_idle().await;
    }

    /// Advances virtual time, then lets every resulting event be handled.
    pub async fn advance(
        &self,
        secs: u64,
    ) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
        self.settle().await;
    }

    pub async fn create_org(
        &self,
        name: &str,
    ) -> ResourcePath {
        let path = ResourcePath::org(name);
        self.store.add(Resource::tenant(path.clone())).unwrap();
        self.settle().await;
        path
    }

    pub async fn create_project(
        &self,
        org: &str,
        name: &str,
    ) -> ResourcePath {
        let path = ResourcePath::project(org, DEFAULT_FOLDER, name);
        self.store.add(Resource::tenant(path.clone())).unwrap();
        self.settle().await;
        path
    }

    pub async fn delete(
        &self,
        path: &ResourcePath,
    ) {
        self.store.delete(path).unwrap();
        self.settle().await;
    }

    pub fn status(
        &self,
        path: &ResourcePath,
    ) -> (StatusIndicator, String) {
        let r = self.store.get(path).unwrap();
        (r.status_indicator(), r.status_message().to_string())
    }

    pub fn store_record(
        &self,
        path: &ResourcePath,
    ) -> Resource {
        self.store.get(path).unwrap()
    }

    pub fn exists(
        &self,
        path: &ResourcePath,
    ) -> bool {
        self.store.contains(path)
    }

    /// Plays watcher `name`: creates its acknowledgment record for `tenant`.
    pub async fn watcher_joins(
        &self,
        tenant: &ResourcePath,
        name: &str,
        indicator: WatcherIndicator,
    ) {
        self.store
            .add(Resource::active_watcher(record_path(tenant, name), indicator))
            .unwrap();
        self.settle().await;
    }

    pub async fn watcher_reports(
        &self,
        tenant: &ResourcePath,
        name: &str,
        indicator: WatcherIndicator,
    ) {
        let mut record = self.store.get(&record_path(tenant, name)).unwrap();
        record.body = ResourceBody::ActiveWatcher(ActiveWatcherBody {
            status: WatcherStatus::new(indicator, ""),
        });
        self.store.update(record).unwrap();
        self.settle().await;
    }

    pub async fn watcher_leaves(
        &self,
        tenant: &ResourcePath,
        name: &str,
    ) {
        self.store.delete(&record_path(tenant, name)).unwrap();
        self.settle().await;
    }
}

pub fn record_path(
    tenant: &ResourcePath,
    watcher: &str,
) -> ResourcePath {
    let kind = tenant.kind().and_then(|k| k.tenant_kind()).unwrap();
    tenant.to_runtime().unwrap().child(kind.active_watcher_kind(), watcher)
}
