use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::ack_timer::AckPhase;
use super::ack_timer::AckTimer;
use super::handlers::ActiveWatcherEventHandler;
use super::handlers::TenantEventHandler;
use super::status_writer::StatusWrite;
use super::status_writer::StatusWriter;
use super::timer_registry::TimerRegistry;
use crate::metrics::FATAL_ERRORS;
use crate::CoordinatorConfig;
use crate::CoordinatorError;
use crate::Resource;
use crate::ResourcePath;
use crate::ResourceStore;
use crate::Result;
use crate::StatusIndicator;
use crate::StoreResult;
use crate::TenantKind;

/// Fixed interval between acknowledgment polls.
pub const ACK_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Who is asking for a status write.
///
/// Event handlers run on the hot path: a failed write there is routed through
/// the fatal policy. Timers only log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOrigin {
    Event,
    Timer,
}

/// Drives Orgs and Projects through creation and deletion by waiting on the
/// acknowledgments of every registered watcher.
pub struct Coordinator {
    pub(crate) store: Arc<dyn ResourceStore>,
    pub(crate) config: CoordinatorConfig,
    pub(crate) status: StatusWriter,
    pub(crate) timers: Arc<TimerRegistry>,
    runtime: Handle,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Builds a coordinator bound to the current tokio runtime.
    pub fn new(
        store: Arc<dyn ResourceStore>,
        config: CoordinatorConfig,
    ) -> Result<Arc<Self>> {
        let runtime = Handle::try_current().map_err(|_| CoordinatorError::NoRuntime)?;
        let status = StatusWriter::new(Arc::clone(&store), config.status.clone());

        Ok(Arc::new(Self {
            store,
            config,
            status,
            timers: Arc::new(TimerRegistry::new()),
            runtime,
        }))
    }

    /// Subscribes the tenant and active-watcher handlers of both tenant kinds.
    pub fn register(self: &Arc<Self>) {
        for kind in TenantKind::ALL {
            self.store.subscribe(
                kind.config_kind(),
                Arc::new(TenantEventHandler::new(kind, Arc::downgrade(self))),
            );
            self.store.subscribe(
                kind.active_watcher_kind(),
                Arc::new(ActiveWatcherEventHandler::new(kind, Arc::downgrade(self))),
            );
        }
        info!("coordinator handlers registered");
    }

    /// Cancels every live acknowledgment timer.
    pub fn shutdown(&self) {
        let live = self.timers.len();
        self.timers.shutdown();
        info!(timers = live, "coordinator shut down");
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Number of acknowledgment timers currently running.
    pub fn live_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn has_timer(
        &self,
        path: &ResourcePath,
    ) -> bool {
        self.timers.is_running(path)
    }

    pub(crate) fn start_timer(
        self: &Arc<Self>,
        kind: TenantKind,
        path: &ResourcePath,
        phase: AckPhase,
    ) {
        let timeout = match phase {
            AckPhase::Create => kind.create_timeout(&self.config.lifecycle),
            AckPhase::Delete => kind.delete_timeout(&self.config.lifecycle),
        };
        debug!(path = %path, ?phase, ?timeout, "starting acknowledgment timer");

        let timer = AckTimer::new(Arc::clone(self), kind, path.clone(), phase, timeout);
        self.timers.start(&self.runtime, path.clone(), |token| timer.run(token));
    }

    /// Writes a status; returns false when the caller should stop driving the resource.
    pub(crate) fn set_status(
        &self,
        origin: WriteOrigin,
        kind: TenantKind,
        path: &ResourcePath,
        indicator: StatusIndicator,
        message: String,
    ) -> bool {
        let outcome = self.status.write(path, indicator, message);
        self.settle_write(origin, kind, path, outcome)
    }

    /// Like [`Self::set_status`] but only applies while the resource is still `from`.
    pub(crate) fn transition_status(
        &self,
        origin: WriteOrigin,
        kind: TenantKind,
        path: &ResourcePath,
        from: StatusIndicator,
        indicator: StatusIndicator,
        message: String,
    ) -> bool {
        let outcome = self.status.transition(path, from, indicator, message);
        self.settle_write(origin, kind, path, outcome)
    }

    /// Surfaces a failure on the resource itself as an `Error` status.
    pub(crate) fn escalate(
        &self,
        origin: WriteOrigin,
        kind: TenantKind,
        path: &ResourcePath,
        message: String,
    ) {
        error!(path = %path, message = %message, "escalating to Error status");
        self.set_status(origin, kind, path, StatusIndicator::Error, message);
    }

    fn settle_write(
        &self,
        origin: WriteOrigin,
        kind: TenantKind,
        path: &ResourcePath,
        outcome: Result<StatusWrite>,
    ) -> bool {
        match outcome {
            Ok(StatusWrite::Written) | Ok(StatusWrite::Unchanged) => true,
            Ok(StatusWrite::Vanished) => {
                debug!(path = %path, "resource vanished before status write");
                false
            }
            Ok(StatusWrite::Superseded) => false,
            Err(e) => {
                match origin {
                    WriteOrigin::Event => self.fatal(kind, path, &e),
                    WriteOrigin::Timer => error!(path = %path, error = %e, "status write failed"),
                }
                false
            }
        }
    }

    /// Unrecoverable failure: aborts the process unless running in test mode.
    pub(crate) fn fatal(
        &self,
        kind: TenantKind,
        path: &ResourcePath,
        err: &dyn Display,
    ) {
        FATAL_ERRORS.with_label_values(&[kind.label()]).inc();
        error!(path = %path, error = %err, "fatal coordinator failure");
        if !self.config.test_mode {
            std::process::abort();
        }
        warn!(path = %path, "test mode: continuing after fatal failure");
    }

    /// Re-reads `path`, applies `mutate` and writes it back, retrying version
    /// conflicts. Returns `Ok(false)` when `mutate` reported nothing to change.
    pub(crate) fn modify(
        &self,
        path: &ResourcePath,
        mutate: impl Fn(&mut Resource) -> bool,
    ) -> StoreResult<bool> {
        let mut conflicts = 0;
        loop {
            let mut resource = self.store.get(path)?;
            if !mutate(&mut resource) {
                return Ok(false);
            }
            match self.store.update(resource) {
                Ok(_) => return Ok(true),
                Err(e) if e.is_conflict() && conflicts < self.config.status.conflict_retries => {
                    conflicts += 1;
                    debug!(path = %path, attempt = conflicts, "update conflicted, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
