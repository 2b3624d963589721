//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up mew CLI defaults.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Handle the configure command
pub fn handle(archive: Option<PathBuf>, save_dir: Option<PathBuf>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config)?;
        return Ok(());
    }

    let mut changed = false;
    if let Some(path) = archive {
        println!("Archive configured: {}", path.display());
        config.archive = Some(path);
        changed = true;
    }
    if let Some(path) = save_dir {
        println!("Save directory configured: {}", path.display());
        config.save_dir = Some(path);
        changed = true;
    }

    if changed {
        config.save()?;
        if let Ok(path) = Config::config_path() {
            println!("Config saved to: {}", path.display());
        }
    } else {
        show_usage();
    }
    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) -> Result<()> {
    println!("Archive:        {}", display_or_unset(config.get_archive()));
    println!("Save directory: {}", display_or_unset(config.get_save_dir()));

    if let Ok(path) = Config::config_path() {
        println!("Config file:    {}", path.display());
    }
    Ok(())
}

fn display_or_unset(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: mew configure --archive PATH/TO/resources.pak");
    println!("   or: mew configure --save-dir PATH/TO/Mewgenics");
    println!("   or: mew configure --show");
}
