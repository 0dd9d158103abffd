use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval_at;
use tokio::time::sleep_until;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::ack_scanner::scan_acks;
use super::lifecycle::WriteOrigin;
use super::lifecycle::ACK_POLL_INTERVAL;
use super::messages;
use super::watcher_directory::expected_watchers;
use super::Coordinator;
use crate::metrics::WATCHER_TIMEOUTS;
use crate::ResourcePath;
use crate::StatusIndicator;
use crate::TenantKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AckPhase {
    /// Waiting for every expected watcher to report `Idle`
    Create,
    /// Waiting for every expected watcher to remove its record
    Delete,
}

impl AckPhase {
    fn as_str(self) -> &'static str {
        match self {
            AckPhase::Create => "create",
            AckPhase::Delete => "delete",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Tick {
    Continue,
    Done,
}

/// Background poll that re-checks acknowledgments on a fixed interval and
/// once more at the deadline.
pub(crate) struct AckTimer {
    coordinator: Arc<Coordinator>,
    kind: TenantKind,
    path: ResourcePath,
    phase: AckPhase,
    timeout: Duration,
}

impl AckTimer {
    pub(crate) fn new(
        coordinator: Arc<Coordinator>,
        kind: TenantKind,
        path: ResourcePath,
        phase: AckPhase,
        timeout: Duration,
    ) -> Self {
        Self {
            coordinator,
            kind,
            path,
            phase,
            timeout,
        }
    }

    pub(crate) async fn run(
        self,
        cancel: CancellationToken,
    ) {
        let start = Instant::now();
        let deadline = sleep_until(start + self.timeout);
        tokio::pin!(deadline);

        let mut poll = interval_at(start + ACK_POLL_INTERVAL, ACK_POLL_INTERVAL);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(path = %self.path, phase = self.phase.as_str(), "acknowledgment timer cancelled");
                    return;
                }
                _ = &mut deadline => {
                    debug!(path = %self.path, phase = self.phase.as_str(), "acknowledgment deadline reached");
                    self.check(true);
                    return;
                }
                _ = poll.tick() => {
                    if self.check(false) == Tick::Done {
                        return;
                    }
                }
            }
        }
    }

    fn check(
        &self,
        at_deadline: bool,
    ) -> Tick {
        match self.phase {
            AckPhase::Create => self.check_create(at_deadline),
            AckPhase::Delete => self.check_delete(at_deadline),
        }
    }

    fn check_create(
        &self,
        at_deadline: bool,
    ) -> Tick {
        let c = &self.coordinator;
        let (kind, path) = (self.kind, &self.path);
        let name = path.name();

        let tenant = match c.store.get(path) {
            Ok(t) => t,
            Err(e) if e.is_not_found() => return Tick::Done,
            Err(e) => {
                c.escalate(WriteOrigin::Timer, kind, path, messages::check_failure(kind, name, &e));
                return Tick::Done;
            }
        };
        if tenant.meta.deletion_requested {
            debug!(path = %path, "deletion requested, abandoning creation timer");
            return Tick::Done;
        }
        match tenant.status_indicator() {
            StatusIndicator::Idle | StatusIndicator::Error => return Tick::Done,
            StatusIndicator::Unset | StatusIndicator::InProgress => {}
        }

        let expected = match expected_watchers(c.store.as_ref(), kind) {
            Ok(w) => w,
            Err(e) => {
                c.escalate(WriteOrigin::Timer, kind, path, messages::directory_failure(kind, &e));
                return Tick::Done;
            }
        };
        let Some(runtime_path) = path.to_runtime() else {
            return Tick::Done;
        };
        let scan = match scan_acks(c.store.as_ref(), &runtime_path, kind, &expected) {
            Ok(s) => s,
            Err(e) if e.is_not_found() => return Tick::Done,
            Err(e) => {
                c.escalate(WriteOrigin::Timer, kind, path, messages::check_failure(kind, name, &e));
                return Tick::Done;
            }
        };

        if scan.all_acknowledged() {
            info!(path = %path, "all watchers acknowledged");
            c.transition_status(
                WriteOrigin::Timer,
                kind,
                path,
                StatusIndicator::InProgress,
                StatusIndicator::Idle,
                messages::create_complete(kind, name),
            );
            return Tick::Done;
        }

        if at_deadline {
            WATCHER_TIMEOUTS
                .with_label_values(&[kind.label(), AckPhase::Create.as_str()])
                .inc();
            warn!(path = %path, pending = ?scan.pending, "watchers did not acknowledge before the deadline");
            c.transition_status(
                WriteOrigin::Timer,
                kind,
                path,
                StatusIndicator::InProgress,
                StatusIndicator::Error,
                messages::ack_timeout(kind, name, &scan.pending),
            );
            return Tick::Done;
        }
        Tick::Continue
    }

    fn check_delete(
        &self,
        at_deadline: bool,
    ) -> Tick {
        let c = &self.coordinator;
        let (kind, path) = (self.kind, &self.path);
        let name = path.name();

        match c.store.get(path) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Tick::Done,
            Err(e) => {
                c.escalate(WriteOrigin::Timer, kind, path, messages::check_failure(kind, name, &e));
                return Tick::Done;
            }
        }

        let expected = match expected_watchers(c.store.as_ref(), kind) {
            Ok(w) => w,
            Err(e) => {
                c.escalate(WriteOrigin::Timer, kind, path, messages::directory_failure(kind, &e));
                return Tick::Done;
            }
        };
        let Some(runtime_path) = path.to_runtime() else {
            return Tick::Done;
        };
        let scan = match scan_acks(c.store.as_ref(), &runtime_path, kind, &expected) {
            Ok(s) => s,
            Err(e) if e.is_not_found() => {
                c.finish_deletion(kind, path);
                return Tick::Done;
            }
            Err(e) => {
                c.escalate(WriteOrigin::Timer, kind, path, messages::check_failure(kind, name, &e));
                return Tick::Done;
            }
        };

        if scan.drained() {
            c.finish_deletion(kind, path);
            return Tick::Done;
        }

        if at_deadline {
            WATCHER_TIMEOUTS
                .with_label_values(&[kind.label(), AckPhase::Delete.as_str()])
                .inc();
            warn!(path = %path, present = ?scan.present, "watchers still active at the deletion deadline, keeping finalizer");
            c.set_status(
                WriteOrigin::Timer,
                kind,
                path,
                StatusIndicator::Error,
                messages::drain_timeout(kind, &scan.present),
            );
            return Tick::Done;
        }
        Tick::Continue
    }
}
