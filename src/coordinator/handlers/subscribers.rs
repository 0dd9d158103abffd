use std::sync::Weak;

use super::super::Coordinator;
use crate::Resource;
use crate::ResourceEventHandler;
use crate::TenantKind;

/// Store subscriber for Org or Project records.
///
/// Holds a weak reference: the store owns its subscribers and must not keep the
/// coordinator alive.
pub struct TenantEventHandler {
    kind: TenantKind,
    coordinator: Weak<Coordinator>,
}

impl TenantEventHandler {
    pub fn new(
        kind: TenantKind,
        coordinator: Weak<Coordinator>,
    ) -> Self {
        Self { kind, coordinator }
    }

    pub fn kind(&self) -> TenantKind {
        self.kind
    }
}

impl ResourceEventHandler for TenantEventHandler {
    fn on_add(
        &self,
        resource: &Resource,
    ) {
        if let Some(c) = self.coordinator.upgrade() {
            c.handle_tenant_add(resource);
        }
    }

    fn on_update(
        &self,
        old: &Resource,
        new: &Resource,
    ) {
        if let Some(c) = self.coordinator.upgrade() {
            c.handle_tenant_update(old, new);
        }
    }

    fn on_delete(
        &self,
        resource: &Resource,
    ) {
        if let Some(c) = self.coordinator.upgrade() {
            c.handle_tenant_removed(resource);
        }
    }
}

/// Store subscriber for the active-watcher records of one tenant kind.
pub struct ActiveWatcherEventHandler {
    kind: TenantKind,
    coordinator: Weak<Coordinator>,
}

impl ActiveWatcherEventHandler {
    pub fn new(
        kind: TenantKind,
        coordinator: Weak<Coordinator>,
    ) -> Self {
        Self { kind, coordinator }
    }

    pub fn kind(&self) -> TenantKind {
        self.kind
    }
}

impl ResourceEventHandler for ActiveWatcherEventHandler {
    fn on_add(
        &self,
        resource: &Resource,
    ) {
        if let Some(c) = self.coordinator.upgrade() {
            c.handle_active_watcher_add(self.kind, resource);
        }
    }

    fn on_update(
        &self,
        old: &Resource,
        new: &Resource,
    ) {
        if let Some(c) = self.coordinator.upgrade() {
            c.handle_active_watcher_update(self.kind, old, new);
        }
    }

    fn on_delete(
        &self,
        resource: &Resource,
    ) {
        if let Some(c) = self.coordinator.upgrade() {
            c.handle_active_watcher_delete(self.kind, resource);
        }
    }
}
