//! Domain layer for ROMSYNC.
//!
//! Models, collaborator traits and pure logic shared by the infrastructure,
//! interaction and application crates.

pub mod artifact;
pub mod cheat;
pub mod config;
pub mod error;
pub mod host;
pub mod platform;
pub mod runtime;
pub mod session;

// Re-export common error type
pub use error::RomsyncError;
