//! # mew
//!
//! Mewgenics modding library - archive reading, cat record parsing, and
//! save renaming.
//!
//! This library provides functionality to:
//! - Read the game's packed resource archive (strictly read-only)
//! - Parse localization CSVs and cat-name pools into entity listings
//! - Decode and re-encode cat records with byte-exact round-trips
//! - Rename cats inside SQLite save files, transactionally and with
//!   verified backups
//!
//! ## Example
//!
//! ```no_run
//! use mew::{apply_name_patch, read_blob, NamePatch, SaveStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SaveStore::open("slot_1.sav")?;
//! for row in store.list_cat_rows()? {
//!     let raw = read_blob(&row)?;
//!     let record = row.category.layout.decode(&raw)?;
//!     println!("{} {}: {:?}", row.category.display_name, row.key, record.display_name());
//! }
//!
//! let row = store.list_cat_rows()?.remove(0);
//! let record = row.category.layout.decode(&read_blob(&row)?)?;
//! let patched = apply_name_patch(&record, &NamePatch { field: "name", new_name: "Whiskers" })?;
//! store.write_blob(&row, &patched.encode())?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod backup;
pub mod blob;
pub mod gamedata;
pub mod patch;
pub mod registry;
pub mod store;

#[doc(inline)]
pub use archive::{Archive, ArchiveEntry, ArchiveError};

#[doc(inline)]
pub use backup::{create_backup, hash_file, list_backups, restore_backup, BackupError};

#[doc(inline)]
pub use blob::{decode, DecodeError, Record, RecordLayout};

#[doc(inline)]
pub use gamedata::{load_entities, load_name_pools, CatNamePool, GameEntity};

#[doc(inline)]
pub use patch::{apply_name_patch, NamePatch, PatchError};

#[doc(inline)]
pub use registry::{save_category, SaveCategory};

#[doc(inline)]
pub use store::{read_blob, CatRow, RowKey, SaveStore, StoreError};
