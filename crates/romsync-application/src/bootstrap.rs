//! Runtime bootstrap.
//!
//! Turns a [`SessionRequest`] into the static [`RuntimeConfig`] the embedded
//! runtime reads once when it is constructed, and writes it through the
//! runtime adapter.

use reqwest::Url;
use romsync_core::RomsyncError;
use romsync_core::cheat::CheatBuffer;
use romsync_core::config::PlayerConfig;
use romsync_core::error::Result;
use romsync_core::platform::{find_platform, requires_threads};
use romsync_core::runtime::{EmulatorRuntime, RuntimeConfig};
use romsync_core::session::{Firmware, RomRef, SessionRequest};

/// Computes and assigns the runtime's static configuration.
#[derive(Debug, Clone)]
pub struct RuntimeBootstrap {
    base_url: String,
    player: PlayerConfig,
}

impl RuntimeBootstrap {
    pub fn new(base_url: impl Into<String>, player: PlayerConfig) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, player }
    }

    /// Derives the configuration for a request.
    ///
    /// The requested core falls back to the platform default when the
    /// platform does not list it. The cheat buffer always starts empty.
    ///
    /// # Errors
    ///
    /// - `UnsupportedPlatform` when the platform slug has no table entry
    /// - `Config` when the base URL is not a usable http(s) URL
    pub fn resolve(&self, request: &SessionRequest) -> Result<RuntimeConfig> {
        let rom = &request.rom;
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| RomsyncError::config(format!("Invalid API base URL '{}': {}", self.base_url, e)))?;
        let platform = find_platform(&rom.platform_slug)
            .ok_or_else(|| RomsyncError::UnsupportedPlatform(rom.platform_slug.clone()))?;

        let core = platform.resolve_core(request.core.as_deref());
        if let Some(requested) = request.core.as_deref() {
            if requested != core {
                tracing::debug!(
                    "[Bootstrap] Core '{}' not available for {}, using '{}'",
                    requested,
                    rom.platform_slug,
                    core
                );
            }
        }

        Ok(RuntimeConfig {
            core: core.to_string(),
            control_scheme: platform.control_scheme.to_string(),
            threads: requires_threads(core),
            game_id: rom.id,
            game_url: game_url(&base_url, rom, request.disc_index)?.into(),
            bios_url: match &request.firmware {
                Some(firmware) => firmware_url(&base_url, firmware)?.into(),
                None => String::new(),
            },
            game_name: sanitize_display_name(&rom.name),
            disc_index: request.disc_index,
            background_color: self.player.background_color.clone(),
            theme_color: self.player.theme_color.clone(),
            start_on_loaded: true,
            cheats: CheatBuffer::empty(),
        })
    }

    /// Resolves the configuration and writes it into the runtime.
    ///
    /// Must run before [`EmulatorRuntime::launch`].
    pub fn apply(
        &self,
        runtime: &dyn EmulatorRuntime,
        request: &SessionRequest,
    ) -> Result<RuntimeConfig> {
        let config = self.resolve(request)?;
        runtime.configure(&config)?;
        tracing::info!(
            "[Bootstrap] Configured runtime: rom={} core={} threads={}",
            config.game_id,
            config.core,
            config.threads
        );
        Ok(config)
    }
}

/// Content URL of a game, selecting a disc when one is given.
pub fn game_url(base_url: &Url, rom: &RomRef, disc_index: Option<u32>) -> Result<Url> {
    let rom_id = rom.id.to_string();
    let mut url = endpoint(base_url, &["api", "roms", &rom_id, "content", &rom.file_name])?;
    if let Some(disc) = disc_index {
        url.query_pairs_mut()
            .append_pair("file_ids", &disc.to_string());
    }
    Ok(url)
}

pub fn firmware_url(base_url: &Url, firmware: &Firmware) -> Result<Url> {
    let firmware_id = firmware.id.to_string();
    endpoint(
        base_url,
        &["api", "firmware", &firmware_id, "content", &firmware.file_name],
    )
}

/// Appends percent-encoded path segments to the base URL's path.
fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| RomsyncError::config(format!("API base URL cannot carry a path: {}", base_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Strips control characters and markup characters from a title.
pub fn sanitize_display_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | '&' | '"' | '\''))
        .collect::<String>()
        .trim()
        .to_string()
}
