//! Adapter surface of the embedded emulation runtime.
//!
//! The runtime reads ambient global configuration and reports progress
//! through global callback hooks. [`EmulatorRuntime`] is the only place that
//! touches that global surface: configuration is written through
//! [`EmulatorRuntime::configure`], hooks are delivered as typed
//! [`RuntimeEvent`]s on a channel, and native methods go through
//! [`EmulatorRuntime::call`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants};
use tokio::sync::mpsc;

use crate::artifact::{Artifact, ArtifactKind};
use crate::cheat::CheatBuffer;
use crate::error::Result;

/// Static configuration the runtime reads once when it is constructed.
///
/// Every field is written on each [`EmulatorRuntime::configure`] call, so a
/// new session always overwrites whatever the previous one left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub core: String,
    pub control_scheme: String,
    pub threads: bool,
    pub game_id: i64,
    pub game_url: String,
    /// Empty when no firmware is selected.
    pub bios_url: String,
    pub game_name: String,
    pub disc_index: Option<u32>,
    pub background_color: String,
    pub theme_color: String,
    pub start_on_loaded: bool,
    pub cheats: CheatBuffer,
}

/// Blob handed over by the runtime when the user saves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCapture {
    pub artifact: Artifact,
    /// Runtime-chosen base file name (no extension), also the local storage
    /// key stem.
    pub base_name: String,
}

/// Hooks the runtime fires at its own discretion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    GameStarted,
    SaveRequested(ArtifactCapture),
    LoadSaveRequested,
    SaveStateRequested(ArtifactCapture),
    LoadStateRequested,
}

impl RuntimeEvent {
    /// Artifact family a save/load event concerns.
    pub fn artifact_kind(&self) -> Option<ArtifactKind> {
        match self {
            RuntimeEvent::GameStarted => None,
            RuntimeEvent::SaveRequested(_) | RuntimeEvent::LoadSaveRequested => {
                Some(ArtifactKind::Save)
            }
            RuntimeEvent::SaveStateRequested(_) | RuntimeEvent::LoadStateRequested => {
                Some(ArtifactKind::State)
            }
        }
    }
}

/// Where the runtime keeps its own save copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SaveLocation {
    Browser,
    Download,
}

/// Native methods of the runtime.
#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(RuntimeMethodKind))]
#[strum_discriminants(derive(Hash, Display))]
pub enum RuntimeMethod {
    ResetCheatTable,
    SetCheat {
        index: usize,
        enabled: bool,
        code: String,
    },
    LoadSave(Vec<u8>),
    LoadState(Vec<u8>),
    /// Prompts the user for a local file; replies with its bytes.
    SelectFile,
    CurrentSave,
    CurrentState,
    Screenshot,
    SetSaveLocation(SaveLocation),
    WriteLocalStorage {
        key: String,
        data: Vec<u8>,
    },
}

impl RuntimeMethod {
    pub fn kind(&self) -> RuntimeMethodKind {
        self.into()
    }

    /// Native load method for an artifact kind.
    pub fn load(kind: ArtifactKind, data: Vec<u8>) -> Self {
        match kind {
            ArtifactKind::Save => RuntimeMethod::LoadSave(data),
            ArtifactKind::State => RuntimeMethod::LoadState(data),
        }
    }
}

impl RuntimeMethodKind {
    pub fn load(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Save => RuntimeMethodKind::LoadSave,
            ArtifactKind::State => RuntimeMethodKind::LoadState,
        }
    }
}

/// Value returned by a native method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuntimeReply {
    #[default]
    Unit,
    Bytes(Option<Vec<u8>>),
}

impl RuntimeReply {
    /// Non-empty payload, if any.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            RuntimeReply::Bytes(Some(bytes)) if !bytes.is_empty() => Some(bytes),
            _ => None,
        }
    }
}

/// Handle returned by [`EmulatorRuntime::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Channel on which the runtime delivers its hooks.
pub type EventSender = mpsc::UnboundedSender<RuntimeEvent>;

/// The embedded runtime as seen by the session controller.
///
/// # Implementation Notes
///
/// - `configure` must be accepted any number of times before `launch`; calls
///   after `launch` only update fields the runtime re-reads (the cheat list).
/// - A session subscribes exactly once after configuring and unsubscribes
///   exactly once on teardown.
/// - `supports` reports whether a native method is callable right now; some
///   methods only appear after the runtime's own startup finishes.
#[async_trait]
pub trait EmulatorRuntime: Send + Sync {
    /// Writes the global configuration surface.
    fn configure(&self, config: &RuntimeConfig) -> Result<()>;

    /// Registers the session's event hooks.
    fn subscribe(&self, events: EventSender) -> Result<SubscriptionId>;

    /// Removes hooks registered by `subscribe`. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Constructs the runtime from the current configuration.
    async fn launch(&self) -> Result<()>;

    /// Whether a native method is currently exposed.
    fn supports(&self, method: RuntimeMethodKind) -> bool;

    /// Invokes a native method.
    async fn call(&self, method: RuntimeMethod) -> Result<RuntimeReply>;
}
