use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::super::ack_scanner::scan_acks;
use super::super::ack_timer::AckPhase;
use super::super::lifecycle::WriteOrigin;
use super::super::messages;
use super::super::watcher_directory::expected_watchers;
use super::super::Coordinator;
use crate::CoordinatorError;
use crate::Resource;
use crate::ResourceKind;
use crate::ResourcePath;
use crate::StatusIndicator;
use crate::StoreError;
use crate::TenantKind;
use crate::COORDINATOR_FINALIZER;
use crate::DEFAULT_FOLDER;

impl Coordinator {
    /// Creation entry point for an Org or Project, also replayed on restart.
    pub fn handle_tenant_add(
        self: &Arc<Self>,
        resource: &Resource,
    ) {
        let Some(kind) = resource.kind().and_then(ResourceKind::tenant_kind) else {
            warn!(path = %resource.path, "add event for a non-tenant resource ignored");
            return;
        };
        let path = &resource.path;
        let name = path.name();
        debug!(path = %path, "tenant add");

        // Events can be stale replays; drive from the stored record
        let tenant = match self.store.get(path) {
            Ok(t) => t,
            Err(e) if e.is_not_found() => return,
            Err(e) => {
                self.escalate(WriteOrigin::Event, kind, path, messages::check_failure(kind, name, &e));
                return;
            }
        };

        if tenant.meta.deletion_requested {
            debug!(path = %path, "tenant already marked for deletion, abandoning creation");
            self.handle_tenant_delete(&tenant);
            return;
        }
        let current = tenant.status_indicator();
        if current == StatusIndicator::Idle {
            trace!(path = %path, "tenant already created");
            return;
        }

        match self.modify(path, |r| r.meta.finalizers.insert(COORDINATOR_FINALIZER.to_string())) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return,
            Err(e) => {
                let message = messages::structural_failure(kind, name, "finalizer", &e);
                self.escalate(WriteOrigin::Event, kind, path, message);
                return;
            }
        }

        if let Err((what, e)) = self.ensure_structure(kind, path) {
            let message = messages::structural_failure(kind, name, what, &e);
            self.escalate(WriteOrigin::Event, kind, path, message);
            return;
        }

        if current == StatusIndicator::Unset
            && !self.set_status(
                WriteOrigin::Event,
                kind,
                path,
                StatusIndicator::InProgress,
                messages::create_initiated(kind, name),
            )
        {
            return;
        }

        let expected = match expected_watchers(self.store.as_ref(), kind) {
            Ok(w) => w,
            Err(e) => {
                self.escalate(WriteOrigin::Event, kind, path, messages::directory_failure(kind, &e));
                return;
            }
        };

        if expected.is_empty() {
            info!(path = %path, "no watchers registered, creation complete");
            self.timers.cancel(path);
            self.set_status(
                WriteOrigin::Event,
                kind,
                path,
                StatusIndicator::Idle,
                messages::create_complete(kind, name),
            );
            return;
        }

        // Watchers may have acknowledged before this event was handled
        let runtime_path = runtime_of(path);
        let scan = match scan_acks(self.store.as_ref(), &runtime_path, kind, &expected) {
            Ok(s) => s,
            Err(e) => {
                self.escalate(WriteOrigin::Event, kind, path, messages::check_failure(kind, name, &e));
                return;
            }
        };
        if scan.all_acknowledged() {
            info!(path = %path, "all watchers already acknowledged");
            self.timers.cancel(path);
            self.set_status(
                WriteOrigin::Event,
                kind,
                path,
                StatusIndicator::Idle,
                messages::create_complete(kind, name),
            );
            return;
        }

        if self.set_status(
            WriteOrigin::Event,
            kind,
            path,
            StatusIndicator::InProgress,
            messages::waiting_for_ack(kind, name, &scan.pending),
        ) {
            info!(path = %path, pending = ?scan.pending, "waiting for watchers to acknowledge");
            self.start_timer(kind, path, AckPhase::Create);
        }
    }

    /// Only the transition into `deletion_requested` starts a deletion.
    pub fn handle_tenant_update(
        self: &Arc<Self>,
        old: &Resource,
        new: &Resource,
    ) {
        if old.meta.deletion_requested || !new.meta.deletion_requested {
            trace!(path = %new.path, "tenant update ignored");
            return;
        }
        self.handle_tenant_delete(new);
    }

    /// Tombstones the runtime mirror and waits for the expected watchers to drain.
    pub fn handle_tenant_delete(
        self: &Arc<Self>,
        resource: &Resource,
    ) {
        let Some(kind) = resource.kind().and_then(ResourceKind::tenant_kind) else {
            return;
        };
        let path = &resource.path;
        let name = path.name();
        info!(path = %path, "tenant deletion started");

        // A creation timer is moot from here on
        self.timers.cancel(path);

        let runtime_path = runtime_of(path);
        match self.store.get(&runtime_path) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                debug!(path = %path, "no runtime footprint, removing tenant");
                self.finish_deletion(kind, path);
                return;
            }
            Err(e) => {
                self.escalate(WriteOrigin::Event, kind, path, messages::check_failure(kind, name, &e));
                return;
            }
        }

        let tombstone = self.modify(&runtime_path, |r| match r.runtime_body_mut() {
            Some(body) if !body.deleted => {
                body.deleted = true;
                true
            }
            _ => false,
        });
        match tombstone {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                self.finish_deletion(kind, path);
                return;
            }
            Err(source) => {
                let err = CoordinatorError::FatalPersist {
                    path: runtime_path.clone(),
                    reason: "runtime tombstone",
                    source,
                };
                self.fatal(kind, path, &err);
                return;
            }
        }

        let expected = match expected_watchers(self.store.as_ref(), kind) {
            Ok(w) => w,
            Err(e) => {
                self.escalate(WriteOrigin::Event, kind, path, messages::directory_failure(kind, &e));
                return;
            }
        };
        let scan = match scan_acks(self.store.as_ref(), &runtime_path, kind, &expected) {
            Ok(s) => s,
            Err(e) if e.is_not_found() => {
                self.finish_deletion(kind, path);
                return;
            }
            Err(e) => {
                self.escalate(WriteOrigin::Event, kind, path, messages::check_failure(kind, name, &e));
                return;
            }
        };

        if scan.drained() {
            self.finish_deletion(kind, path);
            return;
        }

        if self.set_status(
            WriteOrigin::Event,
            kind,
            path,
            StatusIndicator::InProgress,
            messages::waiting_for_drain(&scan.present),
        ) {
            info!(path = %path, present = ?scan.present, "waiting for watchers to drain");
            self.start_timer(kind, path, AckPhase::Delete);
        }
    }

    /// Store-side removal of the tenant record. A removed project may be the
    /// last one holding back its org's deletion.
    pub fn handle_tenant_removed(
        self: &Arc<Self>,
        resource: &Resource,
    ) {
        debug!(path = %resource.path, "tenant removed");
        self.timers.cancel(&resource.path);
        self.status.release(&resource.path);

        if resource.kind() != Some(ResourceKind::Project) {
            return;
        }
        let Some(org_path) = resource.parent_org_name().map(ResourcePath::org) else {
            return;
        };
        let org = match self.store.get(&org_path) {
            Ok(org) => org,
            Err(e) if e.is_not_found() => return,
            Err(e) => {
                warn!(path = %org_path, error = %e, "failed to read parent org");
                return;
            }
        };
        if org.meta.deletion_requested && !self.timers.is_running(&org_path) {
            debug!(path = %org_path, project = %resource.path, "resuming org deletion");
            self.handle_tenant_delete(&org);
        }
    }

    /// Removes the runtime mirror and releases the tenant's finalizer so the
    /// store can drop the record.
    ///
    /// An org is only finished once none of its projects holds the
    /// coordinator's finalizer; the runtime org contains their mirrors.
    pub(crate) fn finish_deletion(
        &self,
        kind: TenantKind,
        path: &ResourcePath,
    ) {
        self.timers.cancel(path);

        if kind == TenantKind::Org {
            match self.finalized_projects(path) {
                Ok(projects) if projects.is_empty() => {}
                Ok(projects) => {
                    info!(path = %path, projects = ?projects, "waiting for projects to be deleted");
                    self.set_status(
                        WriteOrigin::Event,
                        kind,
                        path,
                        StatusIndicator::InProgress,
                        messages::waiting_for_projects(&projects),
                    );
                    return;
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    self.escalate(WriteOrigin::Event, kind, path, messages::check_failure(kind, path.name(), &e));
                    return;
                }
            }
        }

        let runtime_path = runtime_of(path);
        match self.store.delete(&runtime_path) {
            Ok(()) => debug!(path = %runtime_path, "runtime mirror removed"),
            Err(e) if e.is_not_found() => {}
            Err(source) => {
                let err = CoordinatorError::FatalPersist {
                    path: runtime_path,
                    reason: "runtime removal",
                    source,
                };
                self.fatal(kind, path, &err);
                return;
            }
        }

        match self.modify(path, |r| r.meta.finalizers.remove(COORDINATOR_FINALIZER)) {
            Ok(_) => info!(path = %path, "tenant deletion complete"),
            Err(e) if e.is_not_found() => {}
            Err(source) => {
                let err = CoordinatorError::FatalPersist {
                    path: path.clone(),
                    reason: "finalizer removal",
                    source,
                };
                self.fatal(kind, path, &err);
            }
        }
    }

    /// Names of the org's projects that still carry the coordinator's finalizer.
    fn finalized_projects(
        &self,
        org: &ResourcePath,
    ) -> Result<BTreeSet<String>, StoreError> {
        let mut projects = BTreeSet::new();
        for folder in self.store.list_children(org, ResourceKind::Folder)? {
            for project in self.store.list_children(&folder.path, ResourceKind::Project)? {
                if project.has_finalizer(COORDINATOR_FINALIZER) {
                    projects.insert(project.name().to_string());
                }
            }
        }
        Ok(projects)
    }

    /// Creates the structural children and the runtime mirror, tolerating
    /// records that already exist.
    fn ensure_structure(
        &self,
        kind: TenantKind,
        path: &ResourcePath,
    ) -> Result<(), (&'static str, StoreError)> {
        let runtime_path = runtime_of(path);
        let required = match kind {
            TenantKind::Org => vec![
                (
                    "default folder",
                    Resource::folder(path.child(ResourceKind::Folder, DEFAULT_FOLDER)),
                ),
                ("runtime org", Resource::runtime(runtime_path.clone())),
                (
                    "runtime folder",
                    Resource::folder(runtime_path.child(ResourceKind::RuntimeFolder, DEFAULT_FOLDER)),
                ),
            ],
            TenantKind::Project => {
                let mut required = Vec::with_capacity(2);
                if let Some(folder) = runtime_path.parent() {
                    required.push(("runtime folder", Resource::folder(folder)));
                }
                required.push(("runtime project", Resource::runtime(runtime_path)));
                required
            }
        };

        for (what, resource) in required {
            match self.store.add(resource) {
                Ok(r) => trace!(path = %r.path, "structural resource created"),
                Err(e) if e.is_already_exists() => {}
                Err(e) => return Err((what, e)),
            }
        }
        Ok(())
    }
}

/// Runtime mirror of a tenant path. Tenant paths only contain config-tree
/// segments, so the mapping always succeeds for them.
fn runtime_of(path: &ResourcePath) -> ResourcePath {
    path.to_runtime().unwrap_or_default()
}
