//! Session domain model.
//!
//! This module contains the Session entity, the request a view mounts with,
//! the controller's lifecycle phases and the local selection store.

mod model;
mod selection;

pub use model::{Firmware, RomRef, Session, SessionId, SessionPhase, SessionRequest};
pub use selection::{PlayerSelection, SelectionKey, SelectionRepository};
