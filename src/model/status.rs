use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Lifecycle status of an Org or Project.
///
/// Creation moves `Unset -> InProgress -> {Idle, Error}`; deletion reuses
/// `InProgress` while draining and `Error` when the drain times out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusIndicator {
    #[default]
    Unset,
    InProgress,
    Idle,
    Error,
}

impl StatusIndicator {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusIndicator::Unset => "Unset",
            StatusIndicator::InProgress => "InProgress",
            StatusIndicator::Idle => "Idle",
            StatusIndicator::Error => "Error",
        }
    }
}

impl fmt::Display for StatusIndicator {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State reported by a watcher on its own active-watcher record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatcherIndicator {
    #[default]
    InProgress,
    Idle,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantStatus {
    pub indicator: StatusIndicator,
    pub message: String,
    /// Seconds since the unix epoch of the last write
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherStatus {
    pub indicator: WatcherIndicator,
    pub message: String,
    pub timestamp: u64,
}

impl WatcherStatus {
    pub fn new(
        indicator: WatcherIndicator,
        message: impl Into<String>,
    ) -> Self {
        Self {
            indicator,
            message: message.into(),
            timestamp: crate::utils::time::get_now_as_u64(),
        }
    }
}
