use std::collections::BTreeSet;

use tracing::trace;

use crate::ResourcePath;
use crate::ResourceStore;
use crate::StoreResult;
use crate::TenantKind;
use crate::WatcherIndicator;

/// Classification of a runtime resource's active-watcher records against the
/// expected watcher set. Records from watchers outside that set are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AckScan {
    /// Expected watchers with a record in `Idle`
    pub acknowledged: BTreeSet<String>,
    /// Expected watchers with a record in any state
    pub present: BTreeSet<String>,
    /// Expected watchers that have not acknowledged yet
    pub pending: BTreeSet<String>,
}

impl AckScan {
    pub fn all_acknowledged(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drained(&self) -> bool {
        self.present.is_empty()
    }
}

pub fn scan_acks(
    store: &dyn ResourceStore,
    runtime_path: &ResourcePath,
    kind: TenantKind,
    expected: &BTreeSet<String>,
) -> StoreResult<AckScan> {
    let records = store.list_children(runtime_path, kind.active_watcher_kind())?;

    let mut scan = AckScan::default();
    for record in records {
        let name = record.name();
        if !expected.contains(name) {
            trace!(path = %runtime_path, watcher = name, "ignoring unexpected active watcher");
            continue;
        }
        scan.present.insert(name.to_string());
        if record.watcher_status().map(|s| s.indicator) == Some(WatcherIndicator::Idle) {
            scan.acknowledged.insert(name.to_string());
        }
    }
    scan.pending = expected.difference(&scan.acknowledged).cloned().collect();
    Ok(scan)
}
