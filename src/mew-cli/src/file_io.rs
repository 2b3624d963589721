//! File helpers: save discovery, output writing, and the running-game check

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use mew::registry::GAME_PROCESS_NAME;
use sysinfo::System;
use walkdir::WalkDir;

use crate::config::Config;

/// A save file found under a profile directory
#[derive(Debug)]
pub struct SaveInfo {
    /// Profile directory name (usually a numeric account id)
    pub profile: String,
    /// Save file name without extension
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Platform default for the Mewgenics data directory
pub fn default_save_root() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("Glaiel Games").join("Mewgenics"))
}

/// Pick the save scan root: explicit flag, then config, then the platform
/// default
pub fn resolve_save_root(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    let config = Config::load()?;
    if let Some(dir) = config.save_dir {
        return Ok(dir);
    }
    default_save_root()
        .context("No save directory found. Pass --dir or run `mew configure --save-dir <path>`.")
}

/// Scan `<root>/<profile>/saves/*.sav`, newest first
pub fn discover_saves(root: &Path) -> Vec<SaveInfo> {
    let mut saves = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(3)
        .max_depth(3)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        let in_saves_dir = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n == "saves")
            .unwrap_or(false);
        if !in_saves_dir || path.extension().map(|e| e != "sav").unwrap_or(true) {
            continue;
        }

        let profile = path
            .ancestors()
            .nth(2)
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        saves.push(SaveInfo {
            profile,
            name,
            path: path.to_path_buf(),
            modified,
        });
    }
    saves.sort_by(|a, b| b.modified.cmp(&a.modified));
    saves
}

/// True if the Mewgenics process is currently running
pub fn game_is_running() -> bool {
    let system = System::new_all();
    system
        .processes()
        .values()
        .any(|process| process.name().eq_ignore_ascii_case(GAME_PROCESS_NAME))
}

/// Write bytes to a file, or to stdout when no path is given
pub fn write_output(output: Option<&Path>, data: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => std::io::stdout()
            .write_all(data)
            .context("Failed to write to stdout"),
    }
}
