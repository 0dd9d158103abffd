use std::future::Future;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use prometheus::IntGauge;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::metrics::ACK_TIMERS_ACTIVE;
use crate::ResourceKind;
use crate::ResourcePath;

#[derive(Debug)]
struct TimerEntry {
    /// Generation id; a finished timer only removes its own entry
    id: u64,
    token: CancellationToken,
}

/// Live acknowledgment timers keyed by resource identity.
///
/// At most one timer runs per resource: starting a new one cancels the previous
/// one. A timer whose resource reaches a terminal state by another path is
/// cancelled through [`TimerRegistry::cancel`].
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: DashMap<ResourcePath, TimerEntry>,
    next_id: AtomicU64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` on `runtime` as the timer for `path`.
    ///
    /// `task` receives the cancellation token it must observe.
    pub fn start<F, Fut>(
        self: &Arc<Self>,
        runtime: &Handle,
        path: ResourcePath,
        task: F,
    ) -> u64
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        if let Some(previous) = self.timers.insert(
            path.clone(),
            TimerEntry {
                id,
                token: token.clone(),
            },
        ) {
            debug!(path = %path, replaced = previous.id, "replacing running acknowledgment timer");
            previous.token.cancel();
        } else if let Some(gauge) = active_gauge(&path) {
            gauge.inc();
        }

        let fut = task(token);
        let registry = Arc::clone(self);
        runtime.spawn(async move {
            fut.await;
            if registry.timers.remove_if(&path, |_, entry| entry.id == id).is_some() {
                if let Some(gauge) = active_gauge(&path) {
                    gauge.dec();
                }
            }
        });
        id
    }

    /// Cancels the timer for `path`; returns whether one was running.
    pub fn cancel(
        &self,
        path: &ResourcePath,
    ) -> bool {
        let Some((_, entry)) = self.timers.remove(path) else {
            return false;
        };
        debug!(path = %path, timer = entry.id, "cancelling acknowledgment timer");
        entry.token.cancel();
        if let Some(gauge) = active_gauge(path) {
            gauge.dec();
        }
        true
    }

    pub fn is_running(
        &self,
        path: &ResourcePath,
    ) -> bool {
        self.timers.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Cancels every live timer.
    pub fn shutdown(&self) {
        self.timers.retain(|path, entry| {
            entry.token.cancel();
            if let Some(gauge) = active_gauge(path) {
                gauge.dec();
            }
            false
        });
    }
}

/// Per-kind running-timer gauge for a tenant path.
fn active_gauge(path: &ResourcePath) -> Option<IntGauge> {
    let kind = path.kind().and_then(ResourceKind::tenant_kind)?;
    Some(ACK_TIMERS_ACTIVE.with_label_values(&[kind.label()]))
}
