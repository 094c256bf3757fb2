//! Configuration model.
//!
//! Loaded from `config.toml`; every section and field has a default so a
//! missing or partial file still yields a usable configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RootConfig {
    pub api: ApiConfig,
    pub player: PlayerConfig,
    pub log_level: String,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            player: PlayerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Backend connection settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Player tuning.
///
/// The two delays work around the runtime's undocumented readiness timing
/// and are empirical, not guaranteed.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Wait after the runtime reports "game started" before restoring
    /// saves and refreshing cheats.
    pub game_start_delay_ms: u64,
    /// Wait before writing cheats into the runtime's native cheat table.
    pub cheat_apply_delay_ms: u64,
    pub background_color: String,
    pub theme_color: String,
    pub notification_timeout_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            game_start_delay_ms: 1000,
            cheat_apply_delay_ms: 1000,
            background_color: "#0D1117".to_string(),
            theme_color: "#A452FE".to_string(),
            notification_timeout_ms: 4000,
        }
    }
}

impl PlayerConfig {
    pub fn game_start_delay(&self) -> Duration {
        Duration::from_millis(self.game_start_delay_ms)
    }

    pub fn cheat_apply_delay(&self) -> Duration {
        Duration::from_millis(self.cheat_apply_delay_ms)
    }
}
