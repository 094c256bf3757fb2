use anyhow::{Context, Result, bail};
use romsync_application::load_type_registry;
use romsync_core::cheat::{
    CheatBuffer, CheatDraft, CheatFileService, CheatFileUpload, CheatService, CheatSlot,
    CheatTypeRegistry, CheatValidator, parse_cheat_file, render_cheat_file,
};
use romsync_core::config::RootConfig;
use romsync_interaction::LibraryClient;
use std::path::Path;

fn read_text(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn read_drafts(file: &Path, registry: &CheatTypeRegistry) -> Result<Vec<CheatDraft>> {
    Ok(parse_cheat_file(&read_text(file)?, registry))
}

fn print_buffer(buffer: &CheatBuffer) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(buffer)?);
    Ok(())
}

fn client(config: &RootConfig) -> Result<LibraryClient> {
    LibraryClient::new(&config.api).context("Failed to create backend client")
}

/// Cheat buffer of a local file, in file order.
pub fn buffer_from_drafts(drafts: &[CheatDraft]) -> CheatBuffer {
    drafts
        .iter()
        .map(|draft| CheatSlot::new(draft.name.clone(), draft.code.clone()))
        .collect()
}

/// Validation report lines, one per failing entry (1-based).
pub fn validation_report(drafts: &[CheatDraft], registry: &CheatTypeRegistry) -> Vec<String> {
    let validator = CheatValidator::new(registry);
    drafts
        .iter()
        .enumerate()
        .filter_map(|(i, draft)| {
            let draft = validator.sanitize(draft);
            validator
                .validate(&draft)
                .err()
                .map(|errors| format!("#{} {:?}: {}", i + 1, draft.name, errors))
        })
        .collect()
}

pub fn parse(file: &Path) -> Result<()> {
    let drafts = read_drafts(file, CheatTypeRegistry::builtin())?;
    print_buffer(&buffer_from_drafts(&drafts))
}

pub fn validate(file: &Path) -> Result<()> {
    let registry = CheatTypeRegistry::builtin();
    let drafts = read_drafts(file, registry)?;
    let report = validation_report(&drafts, registry);

    for line in &report {
        println!("{}", line);
    }
    if !report.is_empty() {
        bail!("{} of {} cheats failed validation", report.len(), drafts.len());
    }

    println!("{} cheats OK", drafts.len());
    Ok(())
}

pub async fn list(config: &RootConfig, rom_id: i64) -> Result<()> {
    let cheats = client(config)?
        .list(rom_id)
        .await
        .with_context(|| format!("Failed to list cheats for rom {}", rom_id))?;
    print_buffer(&CheatBuffer::from_cheats(&cheats))
}

pub async fn export(config: &RootConfig, rom_id: i64) -> Result<()> {
    let cheats = client(config)?
        .list(rom_id)
        .await
        .with_context(|| format!("Failed to list cheats for rom {}", rom_id))?;
    print!("{}", render_cheat_file(&cheats));
    Ok(())
}

/// Validates against the server's cheat types, then creates every entry.
pub async fn import(config: &RootConfig, file: &Path, rom_id: i64) -> Result<()> {
    let client = client(config)?;
    let registry = load_type_registry(&client).await;
    let drafts = read_drafts(file, &registry)?;
    let report = validation_report(&drafts, &registry);
    if !report.is_empty() {
        for line in &report {
            eprintln!("{}", line);
        }
        bail!("Refusing to import: {} invalid cheats", report.len());
    }

    let validator = CheatValidator::new(&registry);
    for draft in &drafts {
        let created = client
            .create(rom_id, &validator.sanitize(draft))
            .await
            .with_context(|| format!("Failed to create cheat {:?}", draft.name))?;
        tracing::info!("Created cheat {} ({})", created.id, created.name);
    }

    println!("Imported {} cheats into rom {}", drafts.len(), rom_id);
    Ok(())
}

/// Prints the cheat types as JSON, from the server unless `local`.
pub async fn types(config: &RootConfig, local: bool) -> Result<()> {
    let registry = if local {
        CheatTypeRegistry::default()
    } else {
        load_type_registry(&client(config)?).await
    };
    let types: Vec<_> = registry.types().collect();
    println!("{}", serde_json::to_string_pretty(&types)?);
    Ok(())
}

pub async fn list_files(config: &RootConfig, rom_id: i64) -> Result<()> {
    let files = client(config)?
        .list_files(rom_id)
        .await
        .with_context(|| format!("Failed to list cheat files for rom {}", rom_id))?;
    println!("{}", serde_json::to_string_pretty(&files)?);
    Ok(())
}

/// Uploads a cheat file (e.g. a RetroArch `.cht`) as-is.
pub async fn upload_file(config: &RootConfig, file: &Path, rom_id: i64) -> Result<()> {
    let upload = upload_from_path(file, read_text(file)?)?;
    let stored = client(config)?
        .upload_file(rom_id, &upload)
        .await
        .with_context(|| format!("Failed to upload {}", file.display()))?;
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}

pub async fn delete_file(config: &RootConfig, rom_id: i64, file_id: i64) -> Result<()> {
    client(config)?
        .delete_file(rom_id, file_id)
        .await
        .with_context(|| format!("Failed to delete cheat file {}", file_id))?;
    println!("Deleted cheat file {} from rom {}", file_id, rom_id);
    Ok(())
}

fn upload_from_path(file: &Path, content: String) -> Result<CheatFileUpload> {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", file.display()))?;
    Ok(CheatFileUpload::new(file_name, content))
}
