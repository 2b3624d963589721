//! Game-data command handlers

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use mew::gamedata::{self, LANGUAGES};
use mew::Archive;

use crate::cli::OutputFormat;
use crate::config::Config;

/// List named entities parsed from the localization CSVs
pub fn entities(
    archive: Option<PathBuf>,
    category: Option<&str>,
    lang: &str,
    format: OutputFormat,
) -> Result<()> {
    if !LANGUAGES.contains(&lang) {
        bail!("Unknown language `{lang}` (expected one of: {})", LANGUAGES.join(", "));
    }
    let order = gamedata::category_display_order();
    if let Some(id) = category {
        if !order.iter().any(|(cid, _)| *cid == id) {
            bail!("Unknown category: {id}");
        }
    }

    let mut archive = open_archive(archive)?;
    let groups = gamedata::load_entities(&mut archive)?;

    match format {
        OutputFormat::Json => {
            let out = match category {
                Some(id) => {
                    let group = groups.get(id).map(Vec::as_slice).unwrap_or_default();
                    serde_json::to_string_pretty(group)?
                }
                None => serde_json::to_string_pretty(&groups)?,
            };
            println!("{out}");
        }
        OutputFormat::Table => {
            for (id, display_name) in order {
                if category.is_some_and(|c| c != id) {
                    continue;
                }
                let Some(group) = groups.get(id) else { continue };
                println!("{display_name} ({})", group.len());
                for entity in group {
                    println!("  {:<44} {}", entity.key, entity.name(lang).unwrap_or("-"));
                }
                println!();
            }
        }
    }
    Ok(())
}

/// List the cat-name pools
pub fn pools(archive: Option<PathBuf>, format: OutputFormat, full: bool) -> Result<()> {
    let mut archive = open_archive(archive)?;
    let pools = gamedata::load_name_pools(&mut archive)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pools)?),
        OutputFormat::Table => {
            if pools.is_empty() {
                println!("No name pools found in the archive.");
                return Ok(());
            }
            for pool in &pools {
                println!("{:<8} {:>5} names  ({})", pool.label, pool.names.len(), pool.archive_path);
                if full {
                    for name in &pool.names {
                        println!("  {name}");
                    }
                }
            }
        }
    }
    Ok(())
}

/// Resolve the archive path (flag first, then config) and open it
fn open_archive(flag: Option<PathBuf>) -> Result<Archive> {
    let path = resolve_archive(flag)?;
    Archive::open(&path).with_context(|| format!("Failed to open {}", path.display()))
}

fn resolve_archive(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    let config = Config::load()?;
    config
        .archive
        .context("No archive path given. Pass --archive or run `mew configure --archive <path>`.")
}
