use anyhow::{Context, Result};
use clap::Args;
use romsync_application::{RuntimeBootstrap, SelectionService};
use romsync_core::config::RootConfig;
use romsync_core::session::{Firmware, PlayerSelection, RomRef, SessionRequest};
use romsync_infrastructure::TomlSelectionRepository;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Platform slug (e.g. snes, psx, genesis)
    #[arg(long)]
    pub platform: String,

    /// Game id
    #[arg(long)]
    pub rom: i64,

    /// Game file name as stored on the server
    #[arg(long)]
    pub file: String,

    /// Display title (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Emulator core; falls back to the last used one, then the platform default
    #[arg(long)]
    pub core: Option<String>,

    /// Firmware file name; the id falls back to the last used one
    #[arg(long)]
    pub firmware_file: Option<String>,

    #[arg(long, requires = "firmware_file")]
    pub firmware_id: Option<i64>,

    /// Disc index; falls back to the last used one
    #[arg(long)]
    pub disc: Option<u32>,

    /// Remember the resulting selection for the next run
    #[arg(long)]
    pub remember: bool,

    /// Directory holding player_selection.toml (defaults to the data directory)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Builds the request, filling omitted options from the recalled selection.
pub fn build_request(args: &BootstrapArgs, recalled: PlayerSelection) -> SessionRequest {
    let rom = RomRef {
        id: args.rom,
        name: args.name.clone().unwrap_or_else(|| args.file.clone()),
        file_name: args.file.clone(),
        platform_slug: args.platform.clone(),
    };

    let mut request = SessionRequest::new(rom);
    request.core = args.core.clone().or(recalled.core);
    request.disc_index = args.disc.or(recalled.disc_index);
    request.firmware = args.firmware_file.as_ref().and_then(|file_name| {
        args.firmware_id
            .or(recalled.firmware_id)
            .map(|id| Firmware {
                id,
                file_name: file_name.clone(),
            })
    });
    request
}

pub async fn run(config: &RootConfig, args: BootstrapArgs) -> Result<()> {
    let repository = TomlSelectionRepository::new(args.data_dir.as_deref())
        .context("Failed to open player selection store")?;
    let selections = SelectionService::new(Arc::new(repository));

    let recalled = selections
        .recall(&args.platform, args.rom)
        .await
        .context("Failed to read player selection")?;
    tracing::debug!("Recalled selection: {:?}", recalled);

    let request = build_request(&args, recalled);
    let bootstrap = RuntimeBootstrap::new(config.api.base_url.clone(), config.player.clone());
    let runtime_config = bootstrap.resolve(&request)?;

    if args.remember {
        selections
            .remember(&request)
            .await
            .context("Failed to store player selection")?;
    }

    println!("{}", serde_json::to_string_pretty(&runtime_config)?);
    Ok(())
}
