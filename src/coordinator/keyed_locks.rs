use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::Mutex;
use parking_lot::RawMutex;

use crate::ResourcePath;

pub type KeyedGuard = ArcMutexGuard<RawMutex, ()>;

/// One mutex per resource identity.
///
/// Status writes for the same resource are serialized; writes for unrelated
/// resources never contend on the same lock.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<ResourcePath, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the lock for `path` is held.
    pub fn lock(
        &self,
        path: &ResourcePath,
    ) -> KeyedGuard {
        // Clone the Arc out first so the shard lock is not held while waiting
        let mutex = Arc::clone(&self.locks.entry(path.clone()).or_default());
        mutex.lock_arc()
    }

    /// Drops the lock entry for a removed resource if nobody holds or waits on it.
    pub fn release(
        &self,
        path: &ResourcePath,
    ) {
        self.locks.remove_if(path, |_, m| Arc::strong_count(m) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
