use std::sync::Arc;

use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::keyed_locks::KeyedLocks;
use crate::metrics::STATUS_WRITES;
use crate::utils::time::get_now_as_u64;
use crate::CoordinatorError;
use crate::ResourcePath;
use crate::ResourceStore;
use crate::Result;
use crate::StatusConfig;
use crate::StatusIndicator;
use crate::TenantStatus;

/// Outcome of a status write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    Written,
    /// Indicator and message already matched; nothing was persisted
    Unchanged,
    /// The resource no longer exists
    Vanished,
    /// The current indicator was not the one the transition started from
    Superseded,
}

/// Applies status transitions to Org and Project records.
///
/// The whole read-modify-write-verify sequence for one resource runs under that
/// resource's lock.
pub struct StatusWriter {
    store: Arc<dyn ResourceStore>,
    locks: KeyedLocks,
    config: StatusConfig,
}

impl StatusWriter {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        config: StatusConfig,
    ) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            config,
        }
    }

    pub fn write(
        &self,
        path: &ResourcePath,
        indicator: StatusIndicator,
        message: impl Into<String>,
    ) -> Result<StatusWrite> {
        self.apply(path, None, indicator, message.into())
    }

    /// Writes the status only while the resource is still in `from`.
    ///
    /// The check and the write happen under the same lock, so a concurrent
    /// terminal write is never overwritten.
    pub fn transition(
        &self,
        path: &ResourcePath,
        from: StatusIndicator,
        indicator: StatusIndicator,
        message: impl Into<String>,
    ) -> Result<StatusWrite> {
        self.apply(path, Some(from), indicator, message.into())
    }

    fn apply(
        &self,
        path: &ResourcePath,
        from: Option<StatusIndicator>,
        indicator: StatusIndicator,
        message: String,
    ) -> Result<StatusWrite> {
        let kind = path
            .kind()
            .and_then(|k| k.tenant_kind())
            .ok_or_else(|| CoordinatorError::NotATenant { path: path.clone() })?;

        let _guard = self.locks.lock(path);

        let mut conflicts = 0;
        loop {
            let mut tenant = match self.store.get(path) {
                Ok(r) => r,
                Err(e) if e.is_not_found() => return Ok(StatusWrite::Vanished),
                Err(e) => return Err(e.into()),
            };
            let Some(body) = tenant.tenant_body_mut() else {
                return Err(CoordinatorError::NotATenant { path: path.clone() }.into());
            };

            if from.is_some_and(|from| body.status.indicator != from) {
                debug!(path = %path, current = %body.status.indicator, %indicator, "status moved on, transition dropped");
                return Ok(StatusWrite::Superseded);
            }
            if body.status.indicator == indicator && body.status.message == message {
                trace!(path = %path, %indicator, "status unchanged, skipping write");
                return Ok(StatusWrite::Unchanged);
            }

            body.status = TenantStatus {
                indicator,
                message: message.clone(),
                timestamp: get_now_as_u64(),
            };
            if body.runtime_uid.is_empty() {
                body.runtime_uid = self.runtime_uid(path);
            }

            match self.store.update(tenant) {
                Ok(_) => break,
                Err(e) if e.is_conflict() && conflicts < self.config.conflict_retries => {
                    conflicts += 1;
                    debug!(path = %path, attempt = conflicts, "status write conflicted, retrying");
                }
                Err(e) if e.is_not_found() => return Ok(StatusWrite::Vanished),
                Err(e) => return Err(e.into()),
            }
        }

        STATUS_WRITES
            .with_label_values(&[kind.label(), indicator.as_str()])
            .inc();
        debug!(path = %path, %indicator, message = %message, "status written");

        if self.config.verify_writes {
            self.verify(path, indicator)?;
        }
        Ok(StatusWrite::Written)
    }

    fn verify(
        &self,
        path: &ResourcePath,
        expected: StatusIndicator,
    ) -> Result<()> {
        match self.store.get(path) {
            Ok(r) if r.status_indicator() == expected => Ok(()),
            Ok(r) => {
                warn!(path = %path, %expected, actual = %r.status_indicator(), "status verification failed");
                Err(CoordinatorError::StatusVerification {
                    path: path.clone(),
                    expected,
                    actual: r.status_indicator(),
                }
                .into())
            }
            // Removed right after the write; nothing left to verify
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Uid of the runtime counterpart, or empty when it cannot be read.
    fn runtime_uid(
        &self,
        path: &ResourcePath,
    ) -> String {
        path.to_runtime()
            .and_then(|runtime| self.store.get(&runtime).ok())
            .map(|r| r.meta.uid)
            .unwrap_or_default()
    }

    /// Drops the lock entry of a removed resource.
    pub fn release(
        &self,
        path: &ResourcePath,
    ) {
        self.locks.release(path);
    }
}
