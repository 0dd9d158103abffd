//! Tenant Lifecycle Coordinator Error Hierarchy
//!
//! Store failures are split into the benign `NotFound` case and everything else.
//! Coordinator errors never propagate out of an event handler; they are resolved
//! locally and surfaced on the resource's own status.

use std::collections::BTreeSet;

use config::ConfigError;

use crate::ResourcePath;
use crate::StatusIndicator;
use crate::TenantKind;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Resource store failures
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lifecycle protocol failures
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Error {
    /// True when the underlying store reported the resource absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Store(e) if e.is_not_found())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Resource already gone or never existed
    #[error("{path} not found")]
    NotFound { path: ResourcePath },

    #[error("{path} already exists")]
    AlreadyExists { path: ResourcePath },

    /// Optimistic concurrency check failed
    #[error("version conflict on {path}: expected {expected}, found {actual}")]
    Conflict {
        path: ResourcePath,
        expected: u64,
        actual: u64,
    },

    /// Parent path missing on add
    #[error("parent of {path} does not exist")]
    MissingParent { path: ResourcePath },

    /// Any other backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Handlers spawn acknowledgment timers and need a tokio runtime
    #[error("coordinator must be created inside a tokio runtime")]
    NoRuntime,

    #[error("{path} is not an org or project")]
    NotATenant { path: ResourcePath },

    /// Post-write read-back did not observe the written status
    #[error("status verification failed on {path}: wrote {expected}, read {actual}")]
    StatusVerification {
        path: ResourcePath,
        expected: StatusIndicator,
        actual: StatusIndicator,
    },

    #[error("failed to read {kind} watchers: {source}")]
    WatcherDirectory {
        kind: TenantKind,
        #[source]
        source: StoreError,
    },

    /// Expected watchers did not acknowledge or drain before the deadline
    #[error("watchers {outstanding:?} did not respond for {path}")]
    WatcherTimeout {
        path: ResourcePath,
        outstanding: BTreeSet<String>,
    },

    /// Persisting a tombstone or finalizer removal failed
    #[error("failed to persist {reason} on {path}: {source}")]
    FatalPersist {
        path: ResourcePath,
        reason: &'static str,
        #[source]
        source: StoreError,
    },
}
