use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::LifecycleConfig;

/// Every node kind the coordinator reads or writes through the resource store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    // Config tree
    Org,
    Folder,
    Project,

    // Runtime tree
    RuntimeOrg,
    RuntimeFolder,
    RuntimeProject,
    OrgActiveWatcher,
    ProjectActiveWatcher,

    // Watcher directories
    OrgWatcher,
    ProjectWatcher,
}

impl ResourceKind {
    /// Short lowercase tag used in path rendering
    pub fn tag(self) -> &'static str {
        match self {
            ResourceKind::Org => "org",
            ResourceKind::Folder => "folder",
            ResourceKind::Project => "project",
            ResourceKind::RuntimeOrg => "runtime-org",
            ResourceKind::RuntimeFolder => "runtime-folder",
            ResourceKind::RuntimeProject => "runtime-project",
            ResourceKind::OrgActiveWatcher => "org-active-watcher",
            ResourceKind::ProjectActiveWatcher => "project-active-watcher",
            ResourceKind::OrgWatcher => "org-watcher",
            ResourceKind::ProjectWatcher => "project-watcher",
        }
    }

    /// Maps a config-tree kind to its runtime-tree mirror.
    pub fn runtime_counterpart(self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Org => Some(ResourceKind::RuntimeOrg),
            ResourceKind::Folder => Some(ResourceKind::RuntimeFolder),
            ResourceKind::Project => Some(ResourceKind::RuntimeProject),
            _ => None,
        }
    }

    /// Maps a runtime-tree kind back to the config-tree kind it mirrors.
    pub fn config_counterpart(self) -> Option<ResourceKind> {
        match self {
            ResourceKind::RuntimeOrg => Some(ResourceKind::Org),
            ResourceKind::RuntimeFolder => Some(ResourceKind::Folder),
            ResourceKind::RuntimeProject => Some(ResourceKind::Project),
            _ => None,
        }
    }

    pub fn is_tenant(self) -> bool {
        self.tenant_kind().is_some()
    }

    /// The tenant kind this node kind belongs to, if it takes part in the lifecycle protocol.
    pub fn tenant_kind(self) -> Option<TenantKind> {
        match self {
            ResourceKind::Org => Some(TenantKind::Org),
            ResourceKind::Project => Some(TenantKind::Project),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Tenant resources driven through the lifecycle protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenantKind {
    Org,
    Project,
}

impl TenantKind {
    pub const ALL: [TenantKind; 2] = [TenantKind::Org, TenantKind::Project];

    pub fn config_kind(self) -> ResourceKind {
        match self {
            TenantKind::Org => ResourceKind::Org,
            TenantKind::Project => ResourceKind::Project,
        }
    }

    pub fn runtime_kind(self) -> ResourceKind {
        match self {
            TenantKind::Org => ResourceKind::RuntimeOrg,
            TenantKind::Project => ResourceKind::RuntimeProject,
        }
    }

    /// Kind of the per-watcher acknowledgment records under the runtime mirror
    pub fn active_watcher_kind(self) -> ResourceKind {
        match self {
            TenantKind::Org => ResourceKind::OrgActiveWatcher,
            TenantKind::Project => ResourceKind::ProjectActiveWatcher,
        }
    }

    /// Kind of the global watcher directory entries for this tenant kind
    pub fn directory_kind(self) -> ResourceKind {
        match self {
            TenantKind::Org => ResourceKind::OrgWatcher,
            TenantKind::Project => ResourceKind::ProjectWatcher,
        }
    }

    /// Capitalized label, e.g. "Org"
    pub fn label(self) -> &'static str {
        match self {
            TenantKind::Org => "Org",
            TenantKind::Project => "Project",
        }
    }

    /// Lowercase label, e.g. "org"
    pub fn noun(self) -> &'static str {
        match self {
            TenantKind::Org => "org",
            TenantKind::Project => "project",
        }
    }

    pub fn create_timeout(
        self,
        config: &LifecycleConfig,
    ) -> Duration {
        let secs = match self {
            TenantKind::Org => config.org_create_timeout_in_secs,
            TenantKind::Project => config.project_create_timeout_in_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn delete_timeout(
        self,
        config: &LifecycleConfig,
    ) -> Duration {
        let secs = match self {
            TenantKind::Org => config.org_delete_timeout_in_secs,
            TenantKind::Project => config.project_delete_timeout_in_secs,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for TenantKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}
