//! Infrastructure layer for romsync.
//!
//! File locations, configuration loading and the on-disk selection store.

pub mod config_service;
pub mod paths;
pub mod storage;
pub mod toml_selection_repository;

pub use config_service::ConfigService;
pub use paths::{PathError, RomsyncPaths};
pub use toml_selection_repository::TomlSelectionRepository;
