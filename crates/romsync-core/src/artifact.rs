//! Save files and save states.
//!
//! Both kinds are opaque byte blobs with an optional screenshot. The core
//! passes them between the runtime and the backend without looking inside.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::Result;

/// Which of the two persisted artifact families an operation concerns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactKind {
    Save,
    State,
}

impl ArtifactKind {
    /// REST collection segment (`saves` / `states`).
    pub fn collection(self) -> &'static str {
        match self {
            ArtifactKind::Save => "saves",
            ArtifactKind::State => "states",
        }
    }

    /// Multipart field carrying the blob on upload.
    pub fn upload_field(self) -> &'static str {
        match self {
            ArtifactKind::Save => "saveFile",
            ArtifactKind::State => "stateFile",
        }
    }

    /// File extension used for the runtime's local copy.
    pub fn local_extension(self) -> &'static str {
        match self {
            ArtifactKind::Save => "srm",
            ArtifactKind::State => "state",
        }
    }

    /// Human-facing label used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Save => "Save",
            ArtifactKind::State => "State",
        }
    }
}

/// A serialized save or state plus its screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Artifact {
    pub data: Vec<u8>,
    pub screenshot: Option<Vec<u8>>,
}

impl Artifact {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            screenshot: None,
        }
    }

    pub fn with_screenshot(mut self, screenshot: Vec<u8>) -> Self {
        self.screenshot = Some(screenshot);
        self
    }
}

/// Server-side reference to a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: i64,
    pub rom_id: i64,
    pub file_name: String,
    pub download_path: String,
    #[serde(default)]
    pub emulator: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Everything the backend needs to store one artifact.
#[derive(Debug, Clone, Copy)]
pub struct PushRequest<'a> {
    pub kind: ArtifactKind,
    pub rom_id: i64,
    /// Core that produced the artifact.
    pub emulator: Option<&'a str>,
    /// Record to overwrite; `None` creates a new one.
    pub prior: Option<&'a ArtifactRecord>,
    pub file_name: &'a str,
    pub artifact: &'a Artifact,
}

/// Backend storage for saves and states.
#[async_trait]
pub trait ArtifactService: Send + Sync {
    /// Downloads a stored artifact.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))`: The stored blob
    /// - `Ok(None)`: Nothing is stored under that reference
    /// - `Err(_)`: The request failed
    async fn fetch(&self, kind: ArtifactKind, record: &ArtifactRecord) -> Result<Option<Vec<u8>>>;

    /// Uploads an artifact and returns the stored record.
    async fn push(&self, request: PushRequest<'_>) -> Result<ArtifactRecord>;
}
