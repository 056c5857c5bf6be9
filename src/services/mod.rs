//! Domain services
//!
//! - lifecycle: project status and payment state machine
//! - toaster: user-facing notifications
//! - poller: cancellable periodic tasks

pub mod lifecycle;
pub mod poller;
pub mod toaster;

pub use poller::{spawn_poll, PollHandle, Watchers};
pub use toaster::Toaster;
