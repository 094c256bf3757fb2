//! Cheat service trait.

use async_trait::async_trait;

use super::model::{CheatCode, CheatDraft, CheatFile, CheatFileUpload};
use super::types::CheatType;
use crate::error::Result;

/// Backend access to a game's cheat codes.
///
/// The session controller only ever calls [`CheatService::list`]; the
/// mutating operations exist for cheat-management tooling.
#[async_trait]
pub trait CheatService: Send + Sync {
    /// Lists the cheats of a game in server order.
    async fn list(&self, rom_id: i64) -> Result<Vec<CheatCode>>;

    /// Creates a cheat for a game.
    async fn create(&self, rom_id: i64, draft: &CheatDraft) -> Result<CheatCode>;

    /// Replaces the fields of an existing cheat.
    async fn update(&self, rom_id: i64, cheat_id: i64, draft: &CheatDraft) -> Result<CheatCode>;

    /// Deletes a cheat.
    async fn delete(&self, rom_id: i64, cheat_id: i64) -> Result<()>;
}

/// Backend access to the cheat files attached to a game.
#[async_trait]
pub trait CheatFileService: Send + Sync {
    async fn list_files(&self, rom_id: i64) -> Result<Vec<CheatFile>>;

    async fn upload_file(&self, rom_id: i64, upload: &CheatFileUpload) -> Result<CheatFile>;

    async fn delete_file(&self, rom_id: i64, file_id: i64) -> Result<()>;
}

/// The cheat types the server validates against.
#[async_trait]
pub trait CheatTypeSource: Send + Sync {
    /// All server-side types, in server order.
    async fn list_types(&self) -> Result<Vec<CheatType>>;

    /// One type by id; `None` when the server does not know it.
    async fn get_type(&self, type_id: &str) -> Result<Option<CheatType>>;
}
