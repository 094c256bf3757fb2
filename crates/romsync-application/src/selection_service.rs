//! Remembers the player options of the last mount per platform and game.

use std::sync::Arc;

use romsync_core::error::Result;
use romsync_core::session::{PlayerSelection, SelectionKey, SelectionRepository, SessionRequest};

pub struct SelectionService {
    repository: Arc<dyn SelectionRepository>,
}

impl SelectionService {
    pub fn new(repository: Arc<dyn SelectionRepository>) -> Self {
        Self { repository }
    }

    /// Writes the request's firmware/core/disc choice, clearing every option
    /// the request leaves out.
    pub async fn remember(&self, request: &SessionRequest) -> Result<()> {
        let platform = request.rom.platform_slug.as_str();

        self.repository
            .set(
                &SelectionKey::firmware(platform),
                request.firmware.as_ref().map(|f| f.id.to_string()),
            )
            .await?;
        self.repository
            .set(&SelectionKey::core(platform), request.core.clone())
            .await?;
        self.repository
            .set(
                &SelectionKey::disc(request.rom.id),
                request.disc_index.map(|d| d.to_string()),
            )
            .await?;

        tracing::debug!(
            "[SelectionService] Remembered selection for {} / rom {}",
            platform,
            request.rom.id
        );
        Ok(())
    }

    /// Reads the stored selection. Unparseable numbers read as absent.
    pub async fn recall(&self, platform: &str, rom_id: i64) -> Result<PlayerSelection> {
        let firmware = self.repository.get(&SelectionKey::firmware(platform)).await?;
        let core = self.repository.get(&SelectionKey::core(platform)).await?;
        let disc = self.repository.get(&SelectionKey::disc(rom_id)).await?;

        Ok(PlayerSelection {
            firmware_id: parse_number(SelectionKey::firmware(platform), firmware),
            core: core.filter(|c| !c.is_empty()),
            disc_index: parse_number(SelectionKey::disc(rom_id), disc),
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: SelectionKey, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(
                "[SelectionService] Ignoring invalid value {:?} for {}",
                raw,
                key.storage_key()
            );
            None
        }
    }
}
