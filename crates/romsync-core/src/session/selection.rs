//! Last-used player options, remembered between sessions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One remembered option and the scope it is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectionKey {
    /// Firmware id, per platform.
    Firmware { platform: String },
    /// Core name, per platform.
    Core { platform: String },
    /// Disc index, per game.
    Disc { rom_id: i64 },
}

impl SelectionKey {
    pub fn firmware(platform: impl Into<String>) -> Self {
        Self::Firmware {
            platform: platform.into(),
        }
    }

    pub fn core(platform: impl Into<String>) -> Self {
        Self::Core {
            platform: platform.into(),
        }
    }

    pub fn disc(rom_id: i64) -> Self {
        Self::Disc { rom_id }
    }

    /// Flat storage key, e.g. `player:snes:core` or `player:42:disc`.
    pub fn storage_key(&self) -> String {
        match self {
            SelectionKey::Firmware { platform } => format!("player:{}:bios_id", platform),
            SelectionKey::Core { platform } => format!("player:{}:core", platform),
            SelectionKey::Disc { rom_id } => format!("player:{}:disc", rom_id),
        }
    }
}

/// Values recalled for a platform/game pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerSelection {
    pub firmware_id: Option<i64>,
    pub core: Option<String>,
    pub disc_index: Option<u32>,
}

/// Local key/value storage for player selections.
#[async_trait]
pub trait SelectionRepository: Send + Sync {
    /// Reads a stored value.
    async fn get(&self, key: &SelectionKey) -> Result<Option<String>>;

    /// Stores a value; `None` clears the key.
    async fn set(&self, key: &SelectionKey, value: Option<String>) -> Result<()>;
}
