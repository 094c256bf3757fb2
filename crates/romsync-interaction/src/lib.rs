//! Backend adapters for romsync.
//!
//! [`LibraryClient`] talks to the game library's REST API and implements
//! both `CheatService` and `ArtifactService`.

pub mod dto;
pub mod library_client;

pub use library_client::LibraryClient;
