use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;

use super::super::ack_scanner::scan_acks;
use super::super::lifecycle::WriteOrigin;
use super::super::messages;
use super::super::watcher_directory::expected_watchers;
use super::super::Coordinator;
use crate::Resource;
use crate::ResourcePath;
use crate::StatusIndicator;
use crate::TenantKind;
use crate::WatcherIndicator;

impl Coordinator {
    pub fn handle_active_watcher_add(
        self: &Arc<Self>,
        kind: TenantKind,
        record: &Resource,
    ) {
        debug!(path = %record.path, "active watcher added");
        self.recheck_acknowledgments(kind, record);
    }

    /// Only a body change that moves the record into `Idle` is acted on.
    pub fn handle_active_watcher_update(
        self: &Arc<Self>,
        kind: TenantKind,
        old: &Resource,
        new: &Resource,
    ) {
        let became_idle = indicator_of(new) == Some(WatcherIndicator::Idle)
            && indicator_of(old) != Some(WatcherIndicator::Idle);
        if old.body == new.body || !became_idle {
            trace!(path = %new.path, "active watcher update ignored");
            return;
        }
        debug!(path = %new.path, "active watcher acknowledged");
        self.recheck_acknowledgments(kind, new);
    }

    /// Drain check for a tombstoned runtime mirror; benign churn otherwise.
    ///
    /// Only an `InProgress` or `Error` deletion status is refreshed.
    pub fn handle_active_watcher_delete(
        self: &Arc<Self>,
        kind: TenantKind,
        record: &Resource,
    ) {
        let Some((runtime_path, path)) = owners_of(record) else {
            return;
        };
        let name = path.name();

        let runtime = match self.store.get(&runtime_path) {
            Ok(r) => r,
            Err(e) if e.is_not_found() => return,
            Err(e) => {
                error!(path = %runtime_path, error = %e, "failed to read runtime mirror");
                return;
            }
        };
        if !runtime.is_tombstoned() {
            debug!(path = %record.path, "active watcher left a live resource, ignoring");
            return;
        }

        let expected = match expected_watchers(self.store.as_ref(), kind) {
            Ok(w) => w,
            Err(e) => {
                self.escalate(WriteOrigin::Event, kind, &path, messages::directory_failure(kind, &e));
                return;
            }
        };
        let scan = match scan_acks(self.store.as_ref(), &runtime_path, kind, &expected) {
            Ok(s) => s,
            Err(e) if e.is_not_found() => return,
            Err(e) => {
                self.escalate(WriteOrigin::Event, kind, &path, messages::check_failure(kind, name, &e));
                return;
            }
        };

        if scan.drained() {
            info!(path = %path, "last watcher drained");
            self.finish_deletion(kind, &path);
            return;
        }

        // Partial drain: refresh the outstanding list without leaving the
        // current state. A timed-out deletion stays in Error.
        let current = match self.store.get(&path) {
            Ok(t) => t.status_indicator(),
            Err(e) if e.is_not_found() => return,
            Err(e) => {
                error!(path = %path, error = %e, "failed to read tenant");
                return;
            }
        };
        let message = match current {
            StatusIndicator::Error => messages::drain_timeout(kind, &scan.present),
            StatusIndicator::InProgress => messages::waiting_for_drain(&scan.present),
            _ => {
                trace!(path = %path, status = %current, "tenant not draining, status left as is");
                return;
            }
        };
        self.transition_status(WriteOrigin::Event, kind, &path, current, current, message);
    }

    /// Re-scans the tenant's acknowledgments so creation can finish before the
    /// next timer tick. Only a resource still `InProgress` is promoted.
    fn recheck_acknowledgments(
        self: &Arc<Self>,
        kind: TenantKind,
        record: &Resource,
    ) {
        let Some((runtime_path, path)) = owners_of(record) else {
            return;
        };
        let name = path.name();

        let tenant = match self.store.get(&path) {
            Ok(t) => t,
            Err(e) if e.is_not_found() => return,
            Err(e) => {
                error!(path = %path, error = %e, "failed to read tenant");
                return;
            }
        };
        if tenant.meta.deletion_requested || tenant.status_indicator() != StatusIndicator::InProgress {
            trace!(path = %path, status = %tenant.status_indicator(), "tenant not awaiting acknowledgments");
            return;
        }

        let expected = match expected_watchers(self.store.as_ref(), kind) {
            Ok(w) => w,
            Err(e) => {
                self.escalate(WriteOrigin::Event, kind, &path, messages::directory_failure(kind, &e));
                return;
            }
        };
        let scan = match scan_acks(self.store.as_ref(), &runtime_path, kind, &expected) {
            Ok(s) => s,
            Err(e) if e.is_not_found() => return,
            Err(e) => {
                self.escalate(WriteOrigin::Event, kind, &path, messages::check_failure(kind, name, &e));
                return;
            }
        };

        if scan.all_acknowledged() {
            let promoted = self.transition_status(
                WriteOrigin::Event,
                kind,
                &path,
                StatusIndicator::InProgress,
                StatusIndicator::Idle,
                messages::create_complete(kind, name),
            );
            if promoted {
                info!(path = %path, "all watchers acknowledged");
                self.timers.cancel(&path);
            }
            return;
        }
        self.transition_status(
            WriteOrigin::Event,
            kind,
            &path,
            StatusIndicator::InProgress,
            StatusIndicator::InProgress,
            messages::waiting_for_ack(kind, name, &scan.pending),
        );
    }
}

fn indicator_of(record: &Resource) -> Option<WatcherIndicator> {
    record.watcher_status().map(|s| s.indicator)
}

/// Runtime mirror and config-tree tenant that an active-watcher record belongs to.
fn owners_of(record: &Resource) -> Option<(ResourcePath, ResourcePath)> {
    let runtime_path = record.path.parent()?;
    let tenant_path = runtime_path.to_config()?;
    Some((runtime_path, tenant_path))
}
