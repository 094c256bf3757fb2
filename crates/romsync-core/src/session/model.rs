use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::artifact::ArtifactRecord;

/// The game being played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomRef {
    pub id: i64,
    /// Raw display title as stored in the library.
    pub name: String,
    /// File name used in the content URL.
    pub file_name: String,
    pub platform_slug: String,
}

/// A firmware (BIOS) file stored on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firmware {
    pub id: i64,
    pub file_name: String,
}

/// What the view asks for when it mounts the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub rom: RomRef,
    #[serde(default)]
    pub core: Option<String>,
    #[serde(default)]
    pub firmware: Option<Firmware>,
    #[serde(default)]
    pub disc_index: Option<u32>,
    #[serde(default)]
    pub initial_save: Option<ArtifactRecord>,
    #[serde(default)]
    pub initial_state: Option<ArtifactRecord>,
}

impl SessionRequest {
    pub fn new(rom: RomRef) -> Self {
        Self {
            rom,
            core: None,
            firmware: None,
            disc_index: None,
            initial_save: None,
            initial_state: None,
        }
    }

    pub fn with_core(mut self, core: impl Into<String>) -> Self {
        self.core = Some(core.into());
        self
    }

    pub fn with_firmware(mut self, firmware: Firmware) -> Self {
        self.firmware = Some(firmware);
        self
    }

    pub fn with_disc(mut self, disc_index: u32) -> Self {
        self.disc_index = Some(disc_index);
        self
    }

    pub fn with_initial_save(mut self, record: ArtifactRecord) -> Self {
        self.initial_save = Some(record);
        self
    }

    pub fn with_initial_state(mut self, record: ArtifactRecord) -> Self {
        self.initial_state = Some(record);
        self
    }
}

/// Identity of one mounted session; used to drop late results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One live emulation attempt for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub rom: RomRef,
    /// Core actually in use after fallback resolution.
    pub core: String,
    pub firmware: Option<Firmware>,
    pub disc_index: Option<u32>,
    pub initial_save: Option<ArtifactRecord>,
    pub initial_state: Option<ArtifactRecord>,
}

impl Session {
    pub fn new(request: SessionRequest, core: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            rom: request.rom,
            core: core.into(),
            firmware: request.firmware,
            disc_index: request.disc_index,
            initial_save: request.initial_save,
            initial_state: request.initial_state,
        }
    }
}

/// Lifecycle phase of the session controller.
///
/// `CheatsSyncing` is internal: it marks a cheat refresh in progress and is
/// never surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    Uninitialized,
    Bootstrapped,
    Running,
    CheatsSyncing,
    TornDown,
}

impl SessionPhase {
    /// Whether a session is currently mounted.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionPhase::Bootstrapped | SessionPhase::Running | SessionPhase::CheatsSyncing
        )
    }
}
