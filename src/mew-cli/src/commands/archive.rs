//! Archive command handlers

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Component, Path};

use mew::Archive;

use crate::file_io;

/// List directory entries, optionally filtered by a name substring
pub fn list(input: &Path, filter: Option<&str>) -> Result<()> {
    let archive = open(input)?;

    println!("{:>12} {:>12}  NAME", "SIZE", "OFFSET");
    let mut shown = 0usize;
    for entry in archive.entries() {
        if let Some(needle) = filter {
            if !entry.name.contains(needle) {
                continue;
            }
        }
        let compressed = if entry.is_compressed() { "  (lz4)" } else { "" };
        println!(
            "{:>12} {:>12}  {}{}",
            entry.size, entry.offset, entry.name, compressed
        );
        shown += 1;
    }
    println!("{shown} of {} entries", archive.entries().len());
    Ok(())
}

/// Print or save one entry's decompressed bytes
pub fn read(input: &Path, entry: &str, output: Option<&Path>) -> Result<()> {
    let mut archive = open(input)?;
    let data = archive
        .read(entry)
        .with_context(|| format!("Failed to read entry {entry}"))?;
    file_io::write_output(output, &data)
}

/// Extract entries into a directory, preserving archive paths
pub fn extract(input: &Path, out_dir: &Path, names: &[String]) -> Result<()> {
    let mut archive = open(input)?;
    let wanted: Vec<String> = if names.is_empty() {
        archive.entries().iter().map(|e| e.name.clone()).collect()
    } else {
        names.to_vec()
    };

    let mut count = 0usize;
    for name in &wanted {
        ensure_extractable(name)?;
        let data = archive
            .read(name)
            .with_context(|| format!("Failed to read entry {name}"))?;
        let target = out_dir.join(name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&target, &data)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        count += 1;
    }
    println!("Extracted {count} entries to {}", out_dir.display());
    Ok(())
}

fn open(input: &Path) -> Result<Archive> {
    Archive::open(input).with_context(|| format!("Failed to open {}", input.display()))
}

/// Entry names become paths under the output directory; refuse names that
/// would escape it
fn ensure_extractable(name: &str) -> Result<()> {
    let path = Path::new(name);
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        bail!("Entry name escapes the output directory: {name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_names_are_refused() {
        assert!(ensure_extractable("data/text/units.csv").is_ok());
        assert!(ensure_extractable("../outside.txt").is_err());
        assert!(ensure_extractable("data/../../outside.txt").is_err());
        assert!(ensure_extractable("/etc/passwd").is_err());
    }
}
