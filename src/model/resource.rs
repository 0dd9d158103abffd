use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::ResourceKind;
use super::ResourcePath;
use super::StatusIndicator;
use super::TenantStatus;
use super::WatcherIndicator;
use super::WatcherStatus;

/// Opaque storage key assigned by the resource store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey(pub String);

impl fmt::Display for StorageKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-managed metadata carried by every resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub key: StorageKey,
    pub uid: String,
    /// Optimistic concurrency version; bumped by the store on every update
    pub version: u64,
    /// Soft-delete marker set by the store when a finalized resource is deleted
    pub deletion_requested: bool,
    pub finalizers: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantBody {
    pub status: TenantStatus,
    /// Best-effort mirror of the runtime counterpart's uid
    pub runtime_uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeBody {
    /// Tombstone set by the coordinator when draining begins
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWatcherBody {
    pub status: WatcherStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceBody {
    Tenant(TenantBody),
    Folder,
    Runtime(RuntimeBody),
    ActiveWatcher(ActiveWatcherBody),
    WatcherEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub path: ResourcePath,
    pub meta: ObjectMeta,
    pub body: ResourceBody,
}

impl Resource {
    pub fn new(
        path: ResourcePath,
        body: ResourceBody,
    ) -> Self {
        Self {
            path,
            meta: ObjectMeta::default(),
            body,
        }
    }

    /// Fresh Org or Project record with an unset status.
    pub fn tenant(path: ResourcePath) -> Self {
        Self::new(path, ResourceBody::Tenant(TenantBody::default()))
    }

    pub fn folder(path: ResourcePath) -> Self {
        Self::new(path, ResourceBody::Folder)
    }

    pub fn runtime(path: ResourcePath) -> Self {
        Self::new(path, ResourceBody::Runtime(RuntimeBody::default()))
    }

    pub fn active_watcher(
        path: ResourcePath,
        indicator: WatcherIndicator,
    ) -> Self {
        Self::new(
            path,
            ResourceBody::ActiveWatcher(ActiveWatcherBody {
                status: WatcherStatus::new(indicator, ""),
            }),
        )
    }

    pub fn watcher_entry(path: ResourcePath) -> Self {
        Self::new(path, ResourceBody::WatcherEntry)
    }

    pub fn kind(&self) -> Option<ResourceKind> {
        self.path.kind()
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn tenant_body(&self) -> Option<&TenantBody> {
        match &self.body {
            ResourceBody::Tenant(b) => Some(b),
            _ => None,
        }
    }

    pub fn tenant_body_mut(&mut self) -> Option<&mut TenantBody> {
        match &mut self.body {
            ResourceBody::Tenant(b) => Some(b),
            _ => None,
        }
    }

    pub fn runtime_body(&self) -> Option<&RuntimeBody> {
        match &self.body {
            ResourceBody::Runtime(b) => Some(b),
            _ => None,
        }
    }

    pub fn runtime_body_mut(&mut self) -> Option<&mut RuntimeBody> {
        match &mut self.body {
            ResourceBody::Runtime(b) => Some(b),
            _ => None,
        }
    }

    pub fn watcher_status(&self) -> Option<&WatcherStatus> {
        match &self.body {
            ResourceBody::ActiveWatcher(b) => Some(&b.status),
            _ => None,
        }
    }

    /// Tenant status indicator; `Unset` for non-tenant resources.
    pub fn status_indicator(&self) -> StatusIndicator {
        self.tenant_body()
            .map(|b| b.status.indicator)
            .unwrap_or_default()
    }

    pub fn status_message(&self) -> &str {
        self.tenant_body().map(|b| b.status.message.as_str()).unwrap_or("")
    }

    /// True once the runtime mirror carries the coordinator's tombstone.
    pub fn is_tombstoned(&self) -> bool {
        self.runtime_body().map(|b| b.deleted).unwrap_or(false)
    }

    pub fn parent_org_name(&self) -> Option<&str> {
        match self.kind()? {
            ResourceKind::Project | ResourceKind::RuntimeProject => self
                .path
                .ancestor_name(ResourceKind::Org)
                .or_else(|| self.path.ancestor_name(ResourceKind::RuntimeOrg)),
            _ => None,
        }
    }

    pub fn parent_folder_name(&self) -> Option<&str> {
        match self.kind()? {
            ResourceKind::Project | ResourceKind::RuntimeProject => self
                .path
                .ancestor_name(ResourceKind::Folder)
                .or_else(|| self.path.ancestor_name(ResourceKind::RuntimeFolder)),
            _ => None,
        }
    }

    pub fn has_finalizer(
        &self,
        finalizer: &str,
    ) -> bool {
        self.meta.finalizers.contains(finalizer)
    }
}
