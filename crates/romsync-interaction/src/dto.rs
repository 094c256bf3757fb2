//! Wire shapes of the library backend.
//!
//! The backend omits `rom_id` on cheat records and may send `null` for
//! optional fields, so responses are decoded into these DTOs first and then
//! converted into domain types.

use chrono::{DateTime, NaiveDateTime, Utc};
use romsync_core::artifact::ArtifactRecord;
use romsync_core::cheat::{
    CheatCode, CheatDraft, CheatFile, CheatType, CheatTypeRegistry, FALLBACK_PATTERN, RAW_CHEAT_TYPE,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct CheatCodeDto {
    pub id: i64,
    #[serde(default)]
    pub rom_id: Option<i64>,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub cheat_type: Option<String>,
}

impl CheatCodeDto {
    /// Converts into a domain record, filling `rom_id` from the request path
    /// when the body leaves it out.
    pub fn into_domain(self, rom_id: i64) -> CheatCode {
        CheatCode {
            id: self.id,
            rom_id: self.rom_id.unwrap_or(rom_id),
            name: self.name,
            code: self.code,
            description: self.description,
            cheat_type: self
                .cheat_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| RAW_CHEAT_TYPE.to_string()),
        }
    }
}

/// Request body for cheat create/update.
#[derive(Debug, Clone, Serialize)]
pub struct CheatCodeBody<'a> {
    pub name: &'a str,
    pub code: &'a str,
    pub description: Option<&'a str>,
    #[serde(rename = "type")]
    pub cheat_type: &'a str,
}

impl<'a> From<&'a CheatDraft> for CheatCodeBody<'a> {
    fn from(draft: &'a CheatDraft) -> Self {
        Self {
            name: &draft.name,
            code: &draft.code,
            description: draft.description.as_deref(),
            cheat_type: &draft.cheat_type,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactRecordDto {
    pub id: i64,
    pub rom_id: i64,
    pub file_name: String,
    pub download_path: String,
    #[serde(default)]
    pub emulator: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ArtifactRecordDto> for ArtifactRecord {
    fn from(dto: ArtifactRecordDto) -> Self {
        ArtifactRecord {
            id: dto.id,
            rom_id: dto.rom_id,
            file_name: dto.file_name,
            download_path: dto.download_path,
            emulator: dto.emulator.filter(|e| !e.is_empty()),
            updated_at: dto.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheatFileDto {
    pub id: i64,
    #[serde(default)]
    pub rom_id: Option<i64>,
    pub file_name: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

impl CheatFileDto {
    pub fn into_domain(self, rom_id: i64) -> CheatFile {
        CheatFile {
            id: self.id,
            rom_id: self.rom_id.unwrap_or(rom_id),
            file_name: self.file_name,
            file_size: self.file_size,
            uploaded_at: self.uploaded_at.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Accepts RFC 3339 and offset-less timestamps (read as UTC).
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Cheat type as listed by the server. The listing omits ids.
#[derive(Debug, Clone, Deserialize)]
pub struct CheatTypeDto {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
}

impl CheatTypeDto {
    /// Converts into a domain type. The id comes from the body, then from
    /// `known_id` (the id it was requested by), then from the name.
    pub fn into_domain(self, known_id: Option<&str>) -> CheatType {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .or_else(|| known_id.map(str::to_string))
            .unwrap_or_else(|| CheatTypeRegistry::builtin().id_for_name(&self.name));
        CheatType {
            id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            pattern: self
                .pattern
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| FALLBACK_PATTERN.to_string()),
            example: self.example.unwrap_or_default(),
        }
    }
}
