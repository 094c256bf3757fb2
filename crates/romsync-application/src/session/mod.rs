//! Session lifecycle: controller, persistence bridge and deferred cheat
//! apply.

pub mod bridge;
pub mod controller;
pub mod timer;

pub use bridge::{PersistenceBridge, PullOutcome};
pub use controller::{SessionController, SessionServices};
pub use timer::PendingSyncTimer;
