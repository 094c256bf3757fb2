//! TOML-backed SelectionRepository implementation.
//!
//! All remembered selections live in one flat document:
//!
//! ```toml
//! [selections]
//! "player:snes:core" = "snes9x"
//! "player:psx:bios_id" = "12"
//! "player:42:disc" = "2"
//! ```

use crate::paths::RomsyncPaths;
use crate::storage::AtomicTomlFile;
use romsync_core::error::Result;
use romsync_core::session::{SelectionKey, SelectionRepository};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::Mutex;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct SelectionDocument {
    #[serde(default)]
    selections: BTreeMap<String, String>,
}

/// Stores player selections in `player_selection.toml`.
pub struct TomlSelectionRepository {
    file: AtomicTomlFile<SelectionDocument>,
    cache: Mutex<Option<BTreeMap<String, String>>>,
}

impl TomlSelectionRepository {
    /// Opens the repository at the default data directory.
    pub fn default_location() -> Result<Self> {
        Self::new(None)
    }

    /// Opens the repository under `base_dir` (or the default data directory).
    pub fn new(base_dir: Option<&Path>) -> Result<Self> {
        let paths = RomsyncPaths::new(base_dir.map(Path::to_path_buf));
        Ok(Self::at(paths.selection_file()?))
    }

    pub fn at(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
            cache: Mutex::new(None),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.file.load()?.unwrap_or_default().selections)
    }
}

#[async_trait::async_trait]
impl SelectionRepository for TomlSelectionRepository {
    async fn get(&self, key: &SelectionKey) -> Result<Option<String>> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.read_all()?);
        }
        Ok(cache
            .as_ref()
            .and_then(|all| all.get(&key.storage_key()).cloned()))
    }

    async fn set(&self, key: &SelectionKey, value: Option<String>) -> Result<()> {
        let mut cache = self.cache.lock().await;
        let storage_key = key.storage_key();

        let updated = self.file.update(SelectionDocument::default(), |doc| {
            match &value {
                Some(v) => {
                    doc.selections.insert(storage_key.clone(), v.clone());
                }
                None => {
                    doc.selections.remove(&storage_key);
                }
            }
            Ok(doc.selections.clone())
        })?;

        tracing::debug!(
            "[SelectionRepository] {} = {:?}",
            storage_key,
            value.as_deref()
        );
        *cache = Some(updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_get_and_clear() {
        let dir = TempDir::new().unwrap();
        let repo = TomlSelectionRepository::new(Some(dir.path())).unwrap();
        let key = SelectionKey::core("snes");

        assert!(repo.get(&key).await.unwrap().is_none());

        repo.set(&key, Some("snes9x".into())).await.unwrap();
        assert_eq!(repo.get(&key).await.unwrap().as_deref(), Some("snes9x"));

        repo.set(&key, None).await.unwrap();
        assert!(repo.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let repo = TomlSelectionRepository::new(Some(dir.path())).unwrap();
            repo.set(&SelectionKey::firmware("psx"), Some("12".into()))
                .await
                .unwrap();
            repo.set(&SelectionKey::disc(42), Some("2".into()))
                .await
                .unwrap();
        }

        let repo = TomlSelectionRepository::new(Some(dir.path())).unwrap();
        assert_eq!(
            repo.get(&SelectionKey::firmware("psx")).await.unwrap().as_deref(),
            Some("12")
        );
        assert_eq!(
            repo.get(&SelectionKey::disc(42)).await.unwrap().as_deref(),
            Some("2")
        );
        assert!(repo.get(&SelectionKey::core("psx")).await.unwrap().is_none());

        let raw = std::fs::read_to_string(dir.path().join("player_selection.toml")).unwrap();
        assert!(raw.contains("player:psx:bios_id"));
    }
}
