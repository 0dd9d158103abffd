//! Entry points invoked by the store's change notifications.
//!
//! Org/Project events drive creation and deletion; active-watcher events let
//! a resource finish before its acknowledgment timer's next tick.

mod active_watcher_handler;
mod subscribers;
mod tenant_handler;

pub use subscribers::*;
