//! Tenant lifecycle coordinator.
//!
//! Drives Orgs and the Projects nested under them through creation and
//! deletion. Every registered watcher acknowledges a lifecycle event through
//! its own active-watcher record; the coordinator decides when a creation is
//! complete and when a deletion is safe, and reports the outcome on the
//! resource's status.
//!
//! ```ignore
//! let store = MemoryResourceStore::new();
//! store.start();
//! let coordinator = Coordinator::new(Arc::new(store.clone()), CoordinatorConfig::new()?.validate()?)?;
//! coordinator.register();
//! ```

mod config;
mod coordinator;
mod errors;
pub mod metrics;
mod model;
mod storage;
pub mod utils;

pub use config::*;
pub use coordinator::*;
pub use errors::*;
pub use model::*;
pub use storage::*;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
