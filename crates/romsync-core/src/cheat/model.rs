//! Cheat code domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default cheat type id used when none (or an unknown one) is given.
pub const RAW_CHEAT_TYPE: &str = "raw";

/// A cheat code stored on the server for exactly one game.
///
/// The session controller never mutates these; it re-fetches the list
/// whenever it needs a fresh view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheatCode {
    pub id: i64,
    pub rom_id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default = "default_cheat_type")]
    pub cheat_type: String,
}

/// Editable cheat fields, used for create/update requests and for entries
/// parsed from a `cheats.txt` file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheatDraft {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default = "default_cheat_type")]
    pub cheat_type: String,
}

fn default_cheat_type() -> String {
    RAW_CHEAT_TYPE.to_string()
}

impl CheatDraft {
    /// Creates a raw-typed draft.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            description: None,
            cheat_type: default_cheat_type(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_type(mut self, cheat_type: impl Into<String>) -> Self {
        self.cheat_type = cheat_type.into();
        self
    }
}

impl From<&CheatCode> for CheatDraft {
    fn from(cheat: &CheatCode) -> Self {
        Self {
            name: cheat.name.clone(),
            code: cheat.code.clone(),
            description: cheat.description.clone(),
            cheat_type: cheat.cheat_type.clone(),
        }
    }
}

/// A cheat file (for example a RetroArch `.cht`) attached to a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheatFile {
    pub id: i64,
    pub rom_id: i64,
    pub file_name: String,
    pub file_size: u64,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Content of a cheat file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheatFileUpload {
    pub file_name: String,
    pub content: String,
}

impl CheatFileUpload {
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Size in bytes, as reported to the server.
    pub fn file_size(&self) -> u64 {
        self.content.len() as u64
    }
}
