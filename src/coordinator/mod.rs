//! Tenant lifecycle coordination.
//!
//! A tenant is created once every registered watcher has reported `Idle` on its
//! active-watcher record, and removed once every such record is gone. Event
//! handlers react to store notifications; acknowledgment timers poll until a
//! per-kind deadline and mark stragglers with an `Error` status.

mod ack_scanner;
mod ack_timer;
mod handlers;
mod keyed_locks;
mod lifecycle;
pub mod messages;
mod status_writer;
mod timer_registry;
mod watcher_directory;

pub use ack_scanner::*;
pub use handlers::*;
pub use keyed_locks::*;
pub use lifecycle::Coordinator;
pub use lifecycle::ACK_POLL_INTERVAL;
pub use status_writer::*;
pub use timer_registry::*;
pub use watcher_directory::*;
