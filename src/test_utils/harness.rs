use std::sync::Arc;

use crate::Coordinator;
use crate::CoordinatorConfig;
use crate::LifecycleConfig;
use crate::MemoryResourceStore;
use crate::Resource;
use crate::ResourcePath;
use crate::ResourceStore;
use crate::TenantKind;
use crate::WatcherIndicator;
use crate::WatcherStatus;
use crate::DEFAULT_FOLDER;

/// Acknowledgment deadline used by every fixture, in seconds
pub(crate) const TEST_TIMEOUT_IN_SECS: u64 = 8;

pub(crate) fn test_config() -> CoordinatorConfig {
    CoordinatorConfig {
        lifecycle: LifecycleConfig {
            org_create_timeout_in_secs: TEST_TIMEOUT_IN_SECS,
            org_delete_timeout_in_secs: TEST_TIMEOUT_IN_SECS,
            project_create_timeout_in_secs: TEST_TIMEOUT_IN_SECS,
            project_delete_timeout_in_secs: TEST_TIMEOUT_IN_SECS,
        },
        test_mode: true,
        ..Default::default()
    }
}

pub(crate) struct TestHarness {
    pub store: MemoryResourceStore,
    pub coordinator: Arc<Coordinator>,
}

impl TestHarness {
    /// Registers the given watchers, then starts the store and the coordinator.
    pub fn new(
        org_watchers: &[&str],
        project_watchers: &[&str],
    ) -> Self {
        Self::with_config(org_watchers, project_watchers, test_config())
    }

    pub fn with_config(
        org_watchers: &[&str],
        project_watchers: &[&str],
        config: CoordinatorConfig,
    ) -> Self {
        let store = MemoryResourceStore::new();
        for w in org_watchers {
            register_watcher(&store, TenantKind::Org, w);
        }
        for w in project_watchers {
            register_watcher(&store, TenantKind::Project, w);
        }
        store.start();

        let coordinator = Coordinator::new(Arc::new(store.clone()), config).expect("inside a runtime");
        coordinator.register();
        Self { store, coordinator }
    }

    /// Waits until every queued store event has been handled.
    pub async fn settle(&self) {
        self.store.wait_idle().await;
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

    /// Creates `org` first if it does not exist yet.
    pub async fn create_project(
        &self,
        org: &str,
        name: &str,
    ) -> ResourcePath {
        if !self.store.contains(&ResourcePath::org(org)) {
            self.create_org(org).await;
        }
        let path = ResourcePath::project(org, DEFAULT_FOLDER, name);
        self.store.add(Resource::tenant(path.clone())).unwrap();
        self.settle().await;
        path
    }

    pub fn get(
        &self,
        path: &ResourcePath,
    ) -> Resource {
        self.store.get(path).unwrap()
    }

    /// Creates the watcher's active-watcher record under the tenant's runtime mirror.
    pub async fn ack(
        &self,
        tenant: &ResourcePath,
        watcher: &str,
        indicator: WatcherIndicator,
    ) {
        self.store
            .add(Resource::active_watcher(active_watcher_path(tenant, watcher), indicator))
            .unwrap();
        self.settle().await;
    }

    /// Moves an existing active-watcher record to `indicator`.
    pub async fn set_ack(
        &self,
        tenant: &ResourcePath,
        watcher: &str,
        indicator: WatcherIndicator,
    ) {
        let mut record = self.store.get(&active_watcher_path(tenant, watcher)).unwrap();
        record.body = crate::ResourceBody::ActiveWatcher(crate::ActiveWatcherBody {
            status: WatcherStatus::new(indicator, ""),
        });
        self.store.update(record).unwrap();
        self.settle().await;
    }

    pub async fn remove_ack(
        &self,
        tenant: &ResourcePath,
        watcher: &str,
    ) {
        self.store.delete(&active_watcher_path(tenant, watcher)).unwrap();
        self.settle().await;
    }

    pub async fn request_delete(
        &self,
        tenant: &ResourcePath,
    ) {
        self.store.delete(tenant).unwrap();
        self.settle().await;
    }
}

pub(crate) fn register_watcher(
    store: &MemoryResourceStore,
    kind: TenantKind,
    name: &str,
) {
    store
        .add(Resource::watcher_entry(ResourcePath::root().child(kind.directory_kind(), name)))
        .unwrap();
}

pub(crate) fn active_watcher_path(
    tenant: &ResourcePath,
    watcher: &str,
) -> ResourcePath {
    let kind = tenant.kind().and_then(|k| k.tenant_kind()).unwrap();
    tenant.to_runtime().unwrap().child(kind.active_watcher_kind(), watcher)
}
