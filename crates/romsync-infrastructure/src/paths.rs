//! Unified path management for romsync files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/romsync/             # Config directory
//! ├── config.toml                # Application configuration
//! └── logs/                      # Application logs
//!
//! ~/.local/share/romsync/        # Data directory
//! └── player_selection.toml      # Last-used firmware/core/disc
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "romsync";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for romsync_core::RomsyncError {
    fn from(err: PathError) -> Self {
        romsync_core::RomsyncError::config(err.to_string())
    }
}

/// Resolves where romsync keeps its files.
///
/// With a root override (tests, portable installs) both the config and the
/// data directory live under `{root}`; otherwise the platform defaults from
/// `dirs` are used with `romsync` appended.
#[derive(Debug, Clone, Default)]
pub struct RomsyncPaths {
    root: Option<PathBuf>,
}

impl RomsyncPaths {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Returns the romsync configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/romsync/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the romsync data directory.
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn selection_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("player_selection.toml"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}
