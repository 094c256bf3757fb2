//! Configuration service.
//!
//! Loads `RootConfig` from `config.toml`, layers environment overrides on
//! top and caches the result for the lifetime of the service.

use crate::paths::RomsyncPaths;
use crate::storage::AtomicTomlFile;
use romsync_core::RomsyncError;
use romsync_core::config::RootConfig;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

pub const ENV_API_URL: &str = "ROMSYNC_API_URL";
pub const ENV_API_TOKEN: &str = "ROMSYNC_API_TOKEN";

/// Loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Uses the default `config.toml` location.
    pub fn new() -> Result<Self, RomsyncError> {
        let path = RomsyncPaths::default().config_file()?;
        Ok(Self::with_path(path))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Returns the configuration, reading the file on first access.
    ///
    /// A missing file yields defaults. A malformed file is an error and is
    /// not cached, so a fixed file is picked up on the next call.
    pub fn get_config(&self) -> Result<RootConfig, RomsyncError> {
        {
            let cached = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = self.load()?;
        tracing::debug!(
            "[ConfigService] Loaded config from {} (api: {})",
            self.path.display(),
            loaded.api.base_url
        );

        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Forces the next `get_config` to re-read the file.
    pub fn invalidate_cache(&self) {
        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = None;
    }

    fn load(&self) -> Result<RootConfig, RomsyncError> {
        let file: AtomicTomlFile<RootConfig> = AtomicTomlFile::new(&self.path);
        let config = file.load()?.unwrap_or_default();
        Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
    }
}

/// Applies `ROMSYNC_API_URL` / `ROMSYNC_API_TOKEN` over a loaded config.
/// Blank values are ignored.
pub fn apply_env_overrides<F>(mut config: RootConfig, lookup: F) -> RootConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_blank(ENV_API_URL) {
        config.api.base_url = url;
    }
    if let Some(token) = non_blank(ENV_API_TOKEN) {
        config.api.token = Some(token);
    }
    config
}
