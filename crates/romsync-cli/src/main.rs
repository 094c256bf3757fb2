use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use romsync_infrastructure::ConfigService;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "romsync")]
#[command(about = "ROMSYNC CLI - cheat files, server cheats and player bootstrap", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with cheat files and server cheats
    Cheats {
        #[command(subcommand)]
        action: CheatsAction,
    },
    /// Print the runtime configuration a session would start with
    Bootstrap(commands::bootstrap::BootstrapArgs),
}

#[derive(Subcommand)]
enum CheatsAction {
    /// Print the cheat buffer of a cheats.txt file as JSON
    Parse { file: PathBuf },
    /// Validate every entry of a cheats.txt file
    Validate { file: PathBuf },
    /// Fetch a game's cheats from the server and print the cheat buffer
    List {
        #[arg(long)]
        rom: i64,
    },
    /// Fetch a game's cheats from the server as cheats.txt
    Export {
        #[arg(long)]
        rom: i64,
    },
    /// Validate a cheats.txt file and create its entries on the server
    Import {
        file: PathBuf,
        #[arg(long)]
        rom: i64,
    },
    /// Print the cheat types codes are validated against
    Types {
        /// Only the built-in types, without asking the server
        #[arg(long)]
        local: bool,
    },
    /// Manage cheat files (e.g. RetroArch .cht) attached to a game
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },
}

#[derive(Subcommand)]
enum FilesAction {
    /// List a game's cheat files
    List {
        #[arg(long)]
        rom: i64,
    },
    /// Upload a cheat file to a game
    Upload {
        file: PathBuf,
        #[arg(long)]
        rom: i64,
    },
    /// Delete a cheat file from a game
    Delete {
        file_id: i64,
        #[arg(long)]
        rom: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new().context("Failed to locate config directory")?,
    };
    let config = config_service
        .get_config()
        .with_context(|| format!("Failed to load {}", config_service.path().display()))?;

    init_tracing(&config.log_level, cli.verbose);
    tracing::debug!("Using backend at {}", config.api.base_url);

    match cli.command {
        Commands::Cheats { action } => match action {
            CheatsAction::Parse { file } => commands::cheats::parse(&file)?,
            CheatsAction::Validate { file } => commands::cheats::validate(&file)?,
            CheatsAction::List { rom } => commands::cheats::list(&config, rom).await?,
            CheatsAction::Export { rom } => commands::cheats::export(&config, rom).await?,
            CheatsAction::Import { file, rom } => {
                commands::cheats::import(&config, &file, rom).await?
            }
            CheatsAction::Types { local } => commands::cheats::types(&config, local).await?,
            CheatsAction::Files { action } => match action {
                FilesAction::List { rom } => commands::cheats::list_files(&config, rom).await?,
                FilesAction::Upload { file, rom } => {
                    commands::cheats::upload_file(&config, &file, rom).await?
                }
                FilesAction::Delete { file_id, rom } => {
                    commands::cheats::delete_file(&config, rom, file_id).await?
                }
            },
        },
        Commands::Bootstrap(args) => commands::bootstrap::run(&config, args).await?,
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level; `--verbose` wins over both.
fn init_tracing(log_level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug,hyper=warn,reqwest=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
