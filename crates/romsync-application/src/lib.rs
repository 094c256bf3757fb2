//! Application layer for romsync.
//!
//! Wires the runtime adapter, backend services and local selection store
//! into a [`SessionController`].

pub mod bootstrap;
pub mod cheat_sync;
pub mod cheat_types;
pub mod selection_service;
pub mod session;

pub use bootstrap::RuntimeBootstrap;
pub use cheat_sync::CheatSync;
pub use cheat_types::load_type_registry;
pub use selection_service::SelectionService;
pub use session::{PendingSyncTimer, PersistenceBridge, PullOutcome, SessionController, SessionServices};
