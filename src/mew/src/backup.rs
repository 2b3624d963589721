//! Timestamped save backups with integrity verification.
//!
//! Backups live in a `backups/` directory next to the save and are named
//! `{stem}_mew_{timestamp}.savbackup`. Both directions (create and restore)
//! hash the source and the copy and refuse to report success on a mismatch.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::registry::BACKUP_EXTENSION;

/// Errors that can occur during backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("integrity check failed: source {source_hash}, copy {copy_hash}")]
    IntegrityMismatch {
        source_hash: String,
        copy_hash: String,
    },
}

/// Compute the SHA-256 hash of a file
pub fn hash_file(path: &Path) -> Result<String, BackupError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Directory that holds a save's backups
pub fn backup_dir(save_path: &Path) -> PathBuf {
    save_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("backups")
}

/// Copy the save into its backups directory under a timestamped name and
/// verify the copy hashes identically. A copy that fails verification is
/// removed before the error is returned.
pub fn create_backup(save_path: &Path) -> Result<PathBuf, BackupError> {
    if !save_path.exists() {
        return Err(BackupError::NotFound(save_path.to_path_buf()));
    }
    let dir = backup_dir(save_path);
    fs::create_dir_all(&dir)?;

    let stem = file_stem(save_path);
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let backup_path = dir.join(format!("{stem}_mew_{stamp}.{BACKUP_EXTENSION}"));

    fs::copy(save_path, &backup_path)?;
    let source_hash = hash_file(save_path)?;
    let copy_hash = hash_file(&backup_path)?;
    if source_hash != copy_hash {
        let _ = fs::remove_file(&backup_path);
        return Err(BackupError::IntegrityMismatch {
            source_hash,
            copy_hash,
        });
    }
    Ok(backup_path)
}

/// Copy a backup over the save and verify the result
pub fn restore_backup(backup_path: &Path, save_path: &Path) -> Result<(), BackupError> {
    if !backup_path.exists() {
        return Err(BackupError::NotFound(backup_path.to_path_buf()));
    }
    fs::copy(backup_path, save_path)?;
    let source_hash = hash_file(backup_path)?;
    let copy_hash = hash_file(save_path)?;
    if source_hash != copy_hash {
        return Err(BackupError::IntegrityMismatch {
            source_hash,
            copy_hash,
        });
    }
    Ok(())
}

/// Backups belonging to this save, newest first.
///
/// The timestamp format sorts lexicographically in chronological order, so
/// ordering by name is ordering by age.
pub fn list_backups(save_path: &Path) -> Result<Vec<PathBuf>, BackupError> {
    let dir = backup_dir(save_path);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let prefix = format!("{}_mew_", file_stem(save_path));
    let suffix = format!(".{BACKUP_EXTENSION}");

    let mut found = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(&suffix) {
            found.push(entry.path());
        }
    }
    found.sort();
    found.reverse();
    Ok(found)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "save".to_string())
}
