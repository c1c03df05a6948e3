//! Session management - one device session behind a message-passing actor
//!
//! The `Session` owns the control table, the parameter set and the last-sent
//! snapshot. The `SessionActor` owns the `Session` and processes notifications
//! and user requests one at a time from a single channel.

mod actor;
mod actor_handle;
mod commands;
mod store;

pub use actor::SessionActor;
pub use actor_handle::SessionActorHandle;
pub use commands::{ApplyOutcome, SessionCommand};
pub use store::{Applied, DeviceInfo, Session, SessionSnapshot};
