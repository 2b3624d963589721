//! Read-only access to the game's packed resource archive.
//!
//! The archive is never written through this module; the underlying file is
//! opened read-only and every operation leaves it byte-identical.
//!
//! # Archive format
//!
//! | Offset | Size | Field                       |
//! |--------|------|-----------------------------|
//! | 0      | 4    | Magic `ARC1`                |
//! | 4      | 4    | Entry count (u32 LE)        |
//! | 8      | ...  | Directory, one per entry    |
//!
//! Each directory entry is a u16 LE name length, the UTF-8 name, a u64 LE
//! payload offset, a u32 LE stored size, and a flags byte (bit 0 set means
//! the payload is LZ4-compressed). Compressed payloads start with a u32 LE
//! uncompressed size, followed by a raw LZ4 block.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use thiserror::Error;

/// First four bytes of every archive
pub const ARCHIVE_MAGIC: &[u8; 4] = b"ARC1";

const FLAG_COMPRESSED: u8 = 0b0000_0001;

/// Largest accepted decompressed entry. Bigger declared sizes are treated
/// as corruption rather than an allocation request.
const MAX_DECOMPRESSED_LEN: usize = 256 * 1024 * 1024;

/// Errors that can occur while reading an archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("not an archive: bad magic {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("archive truncated while reading {0}")]
    Truncated(String),

    #[error("archive has no entry named `{0}`")]
    NotFound(String),

    #[error("entry `{name}` failed to decompress: {reason}")]
    DecompressionFailed { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One directory record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    /// Byte offset of the payload within the archive file
    pub offset: u64,
    /// Stored (possibly compressed) payload size
    pub size: u32,
    pub flags: u8,
}

impl ArchiveEntry {
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Open handle on a packed archive
#[derive(Debug)]
pub struct Archive {
    file: File,
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Open an archive and parse its directory.
    ///
    /// Every directory entry is bounds-checked against the file size up
    /// front, so a directory that points past the end fails here rather
    /// than on first read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let mut file = File::options().read(true).open(path.as_ref())?;
        let file_len = file.metadata()?.len();

        let mut header = [0u8; 8];
        read_bytes(&mut file, &mut header, "header")?;
        if &header[..4] != ARCHIVE_MAGIC {
            return Err(ArchiveError::BadMagic([
                header[0], header[1], header[2], header[3],
            ]));
        }
        let count = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        // count is untrusted, so cap the preallocation
        let mut entries = Vec::with_capacity((count as usize).min(1024));
        for _ in 0..count {
            let mut name_len = [0u8; 2];
            read_bytes(&mut file, &mut name_len, "directory")?;
            let mut name = vec![0u8; u16::from_le_bytes(name_len) as usize];
            read_bytes(&mut file, &mut name, "directory")?;
            let name = String::from_utf8_lossy(&name).into_owned();

            let mut fields = [0u8; 13];
            read_bytes(&mut file, &mut fields, &name)?;
            let offset = u64::from_le_bytes([
                fields[0], fields[1], fields[2], fields[3], fields[4], fields[5], fields[6],
                fields[7],
            ]);
            let size = u32::from_le_bytes([fields[8], fields[9], fields[10], fields[11]]);
            let flags = fields[12];

            if offset.saturating_add(u64::from(size)) > file_len {
                return Err(ArchiveError::Truncated(name));
            }
            entries.push(ArchiveEntry {
                name,
                offset,
                size,
                flags,
            });
        }

        Ok(Archive { file, entries })
    }

    /// All directory entries, in archive order
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Look up a directory entry by name
    pub fn entry(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Read an entry's payload, transparently decompressed
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .entry(name)
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(name.to_string()))?;
        self.read_entry(&entry)
    }

    /// Read a payload for an entry obtained from [`Archive::entries`]
    pub fn read_entry(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>, ArchiveError> {
        self.file.seek(SeekFrom::Start(entry.offset))?;
        let mut data = vec![0u8; entry.size as usize];
        read_bytes(&mut self.file, &mut data, &entry.name)?;

        if !entry.is_compressed() {
            return Ok(data);
        }
        decompress_entry(&entry.name, &data)
    }
}

fn read_bytes(file: &mut File, buf: &mut [u8], what: &str) -> Result<(), ArchiveError> {
    file.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ArchiveError::Truncated(what.to_string())
        } else {
            ArchiveError::Io(e)
        }
    })
}

fn decompress_entry(name: &str, data: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    if data.len() < 4 {
        return Err(ArchiveError::DecompressionFailed {
            name: name.to_string(),
            reason: "payload shorter than its size prefix".to_string(),
        });
    }
    let raw_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if raw_len > MAX_DECOMPRESSED_LEN {
        return Err(ArchiveError::DecompressionFailed {
            name: name.to_string(),
            reason: format!("declared size {raw_len} exceeds the decompression cap"),
        });
    }
    lz4_flex::decompress(&data[4..], raw_len).map_err(|e| ArchiveError::DecompressionFailed {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
