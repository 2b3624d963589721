//! Save file command handlers

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use std::path::Path;

use mew::store::{read_blob, RowKey, SaveStore};
use mew::{apply_name_patch, registry, CatRow, NamePatch};

use crate::file_io;

/// List save files under the profile directory, newest first
pub fn saves(dir: Option<&Path>) -> Result<()> {
    let root = file_io::resolve_save_root(dir)?;
    let saves = file_io::discover_saves(&root);
    if saves.is_empty() {
        println!("No save files found under {}", root.display());
        return Ok(());
    }

    println!("{:<20} {:<12} {:<17} PATH", "PROFILE", "SAVE", "MODIFIED");
    for save in saves {
        let modified = DateTime::<Local>::from(save.modified)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        println!(
            "{:<20} {:<12} {:<17} {}",
            save.profile,
            save.name,
            modified,
            save.path.display()
        );
    }
    Ok(())
}

/// List the cat rows in a save with their decoded names
pub fn list(input: &Path, category: Option<&str>) -> Result<()> {
    let store = SaveStore::open_read_only(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;

    let rows = match category {
        Some(id) => {
            let category = registry::save_category(id)
                .with_context(|| format!("Unknown category: {id}"))?;
            store.rows(category)?
        }
        None => store.list_cat_rows()?,
    };
    if rows.is_empty() {
        println!("No cat rows found.");
        return Ok(());
    }

    println!("{:<14} {:<16} {:<26} {:>8}", "CATEGORY", "KEY", "NAME", "SIZE");
    for row in &rows {
        let marker = if row.category.read_only {
            "  (read-only)"
        } else {
            ""
        };
        println!(
            "{:<14} {:<16} {:<26} {:>8}{}",
            row.category.id,
            row.key,
            row_display_name(row),
            row.declared_size,
            marker
        );
    }
    Ok(())
}

/// Rename one cat row, backing the save up first unless told otherwise
pub fn rename(
    input: &Path,
    key: &str,
    new_name: &str,
    category: &str,
    no_backup: bool,
    force: bool,
) -> Result<()> {
    let category = registry::save_category(category)
        .with_context(|| format!("Unknown category: {category}"))?;
    if category.read_only {
        bail!("{} rows are read-only", category.display_name);
    }

    let chars = new_name.chars().count();
    if chars < registry::MIN_NAME_CHARS || chars > registry::MAX_NAME_CHARS {
        bail!(
            "Name must be {}-{} characters, got {}",
            registry::MIN_NAME_CHARS,
            registry::MAX_NAME_CHARS,
            chars
        );
    }
    ensure_game_not_running(force)?;

    let mut store =
        SaveStore::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let row = find_row(&store, category, key)?;

    let raw = read_blob(&row).context("Failed to decompress cat row")?;
    let record = category
        .layout
        .decode(&raw)
        .context("Failed to parse cat record")?;
    let old_name = record.display_name().unwrap_or("<unnamed>").to_string();

    let patched = apply_name_patch(
        &record,
        &NamePatch {
            field: "name",
            new_name,
        },
    )?;

    if !no_backup {
        let backup_path = mew::backup::create_backup(input).context("Failed to create backup")?;
        println!("Backup: {}", backup_path.display());
    }

    store
        .write_blob(&row, &patched.encode())
        .context("Failed to write save")?;
    println!(
        "Renamed {old_name} -> {new_name} ({} row {})",
        category.display_name, row.key
    );
    Ok(())
}

/// Create a timestamped backup of the save
pub fn backup(input: &Path) -> Result<()> {
    let path = mew::backup::create_backup(input)
        .with_context(|| format!("Failed to back up {}", input.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

/// List the save's backups, newest first
pub fn backups(input: &Path) -> Result<()> {
    let found = mew::backup::list_backups(input)?;
    if found.is_empty() {
        println!(
            "No backups found in {}",
            mew::backup::backup_dir(input).display()
        );
        return Ok(());
    }
    for path in found {
        println!("{}", path.display());
    }
    Ok(())
}

/// Restore a backup over the save
pub fn restore(input: &Path, backup_file: &Path, force: bool) -> Result<()> {
    ensure_game_not_running(force)?;
    mew::backup::restore_backup(backup_file, input)
        .with_context(|| format!("Failed to restore {}", backup_file.display()))?;
    println!(
        "Restored {} from {}",
        input.display(),
        backup_file.display()
    );
    Ok(())
}

fn ensure_game_not_running(force: bool) -> Result<()> {
    if !force && file_io::game_is_running() {
        bail!("Mewgenics appears to be running. Close it and retry, or pass --force.");
    }
    Ok(())
}

fn find_row(
    store: &SaveStore,
    category: &'static registry::SaveCategory,
    key: &str,
) -> Result<CatRow> {
    let wanted = match key.parse::<i64>() {
        Ok(i) => RowKey::Int(i),
        Err(_) => RowKey::Text(key.to_string()),
    };
    store
        .rows(category)?
        .into_iter()
        .find(|row| row.key == wanted)
        .with_context(|| format!("No {} row with key {key}", category.display_name))
}

fn row_display_name(row: &CatRow) -> String {
    let raw = match read_blob(row) {
        Ok(raw) => raw,
        Err(_) => return "<unreadable>".to_string(),
    };
    match row.category.layout.decode(&raw) {
        Ok(record) => record
            .display_name()
            .map(str::to_string)
            .unwrap_or_else(|| "<unnamed>".to_string()),
        Err(_) => "<unrecognized format>".to_string(),
    }
}
