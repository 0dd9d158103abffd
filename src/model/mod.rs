//! Resource identity and records shared by the coordinator and the store.
//!
//! The config tree holds the externally authored records:
//!
//! ```text
//! /org:<name>/folder:default/project:<name>
//! ```
//!
//! The runtime tree mirrors it and carries the per-watcher acknowledgment records:
//!
//! ```text
//! /runtime-org:<name>/org-active-watcher:<watcher>
//! /runtime-org:<name>/runtime-folder:default/runtime-project:<name>/project-active-watcher:<watcher>
//! ```
//!
//! Watcher directory entries live directly under the root (`/org-watcher:<name>`,
//! `/project-watcher:<name>`).

mod kind;
mod path;
mod resource;
mod status;

pub use kind::*;
pub use path::*;
pub use resource::*;
pub use status::*;


/// Structural folder auto-created under every org in both trees
pub const DEFAULT_FOLDER: &str = "default";

/// Finalizer that keeps a tenant resource in the store until its drain completes
pub const COORDINATOR_FINALIZER: &str = "tenant-coordinator.lifecycle/drain";
