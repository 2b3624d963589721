//! Save-file access: enumerate cat rows and move blob bytes in and out of
//! the save's SQLite database.
//!
//! The store is blob-format agnostic. Rows carry LZ4-compressed bytes next
//! to a declared uncompressed size; decoding those bytes is [`crate::blob`]'s
//! job. Writes happen inside an immediate transaction with a read-back
//! check, so a save is either updated completely or left exactly as it was.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use lz4_flex::block::DecompressError;
use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, ToSql, TransactionBehavior};
use thiserror::Error;

use crate::registry::{self, SaveCategory};

/// Errors that can occur while working with a save database
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("not a Mewgenics save (no known tables): {0}")]
    InvalidSave(String),

    #[error("save database is locked (is the game running?)")]
    Locked,

    #[error("row declares {declared} bytes but holds {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("row data is not a valid LZ4 block: {0}")]
    Corrupt(DecompressError),

    #[error("write rejected: {0}")]
    WriteRejected(String),

    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),
}

/// Primary key of a cat row. Integer for `cats` and `winning_teams`, text
/// for `files`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKey {
    Int(i64),
    Text(String),
}

impl RowKey {
    fn from_value(value: Value) -> Option<RowKey> {
        match value {
            Value::Integer(i) => Some(RowKey::Int(i)),
            Value::Text(s) => Some(RowKey::Text(s)),
            _ => None,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Int(i) => write!(f, "{i}"),
            RowKey::Text(s) => write!(f, "{s}"),
        }
    }
}

impl ToSql for RowKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            RowKey::Int(i) => ToSqlOutput::from(*i),
            RowKey::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

/// One cat row as stored: its key, the stored (possibly compressed) bytes,
/// and the declared uncompressed size
#[derive(Debug, Clone)]
pub struct CatRow {
    pub category: &'static SaveCategory,
    pub key: RowKey,
    pub data: Vec<u8>,
    pub declared_size: usize,
}

/// Open handle on a save database
#[derive(Debug)]
pub struct SaveStore {
    conn: Connection,
    path: PathBuf,
}

impl SaveStore {
    /// Open a save for reading and writing
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    /// Open a save without the ability to write
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    fn open_with(path: &Path, flags: OpenFlags) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(format!(
                "save file {}",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(path, flags).map_err(sql_err)?;
        let store = SaveStore {
            conn,
            path: path.to_path_buf(),
        };
        store.validate_schema()?;
        Ok(store)
    }

    /// Path this store was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A save must contain at least one of the known cat tables
    fn validate_schema(&self) -> Result<(), StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
            .map_err(sql_err)?;
        let tables: HashSet<String> = stmt
            .query_map([], |row| row.get(0))
            .map_err(sql_err)?
            .collect::<Result<_, _>>()
            .map_err(sql_err)?;

        if registry::SAVE_CATEGORIES
            .iter()
            .any(|c| tables.contains(c.table))
        {
            Ok(())
        } else {
            Err(StoreError::InvalidSave(self.path.display().to_string()))
        }
    }

    fn has_table(&self, name: &str) -> Result<bool, StoreError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |row| row.get(0),
            )
            .map_err(sql_err)?;
        Ok(count > 0)
    }

    /// Cat rows of one category. Rows with NULL or empty data are skipped,
    /// as are keys of types the category does not use.
    pub fn rows(&self, category: &'static SaveCategory) -> Result<Vec<CatRow>, StoreError> {
        if !self.has_table(category.table)? {
            return Ok(Vec::new());
        }
        let sql = match category.key_filter {
            Some(_) => format!(
                "SELECT key, data, size FROM {} WHERE key = ?1 ORDER BY key",
                category.table
            ),
            None => format!("SELECT key, data, size FROM {} ORDER BY key", category.table),
        };
        let mut stmt = self.conn.prepare(&sql).map_err(sql_err)?;
        let mut rows = match category.key_filter {
            Some(filter) => stmt.query(params![filter]),
            None => stmt.query([]),
        }
        .map_err(sql_err)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(sql_err)? {
            let key: Value = row.get(0).map_err(sql_err)?;
            let Some(key) = RowKey::from_value(key) else {
                continue;
            };
            let data: Option<Vec<u8>> = row.get(1).map_err(sql_err)?;
            let Some(data) = data else { continue };
            if data.is_empty() {
                continue;
            }
            let size: Option<i64> = row.get(2).map_err(sql_err)?;
            let Some(declared_size) = size.and_then(|s| usize::try_from(s).ok()) else {
                continue;
            };
            out.push(CatRow {
                category,
                key,
                data,
                declared_size,
            });
        }
        Ok(out)
    }

    /// Cat rows across every category, in category display order
    pub fn list_cat_rows(&self) -> Result<Vec<CatRow>, StoreError> {
        let mut out = Vec::new();
        for category in registry::SAVE_CATEGORIES.iter().copied() {
            out.extend(self.rows(category)?);
        }
        Ok(out)
    }

    /// Recompress `raw` and write it, with its new declared size, to the
    /// row's table in one transaction.
    ///
    /// The previous stored bytes are read first and returned to the caller.
    /// The update is verified by reading the row back inside the same
    /// transaction; any failure past that point rolls everything back, so
    /// the save never holds a half-written row.
    pub fn write_blob(&mut self, row: &CatRow, raw: &[u8]) -> Result<Vec<u8>, StoreError> {
        let table = row.category.table;
        let stored = pack_row(raw);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(sql_err)?;

        let select = format!("SELECT data, size FROM {table} WHERE key = ?1");
        let previous: Option<(Option<Vec<u8>>, Option<i64>)> = tx
            .query_row(&select, params![row.key], |r| Ok((r.get(0)?, r.get(1)?)))
            .optional()
            .map_err(sql_err)?;
        let Some((previous_data, _)) = previous else {
            return Err(StoreError::NotFound(format!("{table} row {}", row.key)));
        };

        let update = format!("UPDATE {table} SET data = ?1, size = ?2 WHERE key = ?3");
        let changed = tx
            .execute(&update, params![stored, raw.len() as i64, row.key])
            .map_err(sql_err)?;
        if changed != 1 {
            return Err(StoreError::WriteRejected(format!(
                "expected to update 1 row, matched {changed}"
            )));
        }

        let (data_back, size_back): (Vec<u8>, i64) = tx
            .query_row(&select, params![row.key], |r| Ok((r.get(0)?, r.get(1)?)))
            .map_err(sql_err)?;
        if data_back != stored || size_back != raw.len() as i64 {
            return Err(StoreError::WriteRejected(
                "read-back does not match the written row".to_string(),
            ));
        }

        tx.commit().map_err(|e| match sql_err(e) {
            StoreError::Sqlite(err) => StoreError::WriteRejected(format!("commit failed: {err}")),
            other => other,
        })?;
        Ok(previous_data.unwrap_or_default())
    }
}

/// Decompress a row's stored bytes and verify them against the declared
/// size. Rows whose stored length equals the declared size are stored raw
/// and returned as-is.
pub fn read_blob(row: &CatRow) -> Result<Vec<u8>, StoreError> {
    if row.data.len() == row.declared_size {
        return Ok(row.data.clone());
    }
    match lz4_flex::decompress(&row.data, row.declared_size) {
        Ok(raw) => Ok(raw),
        Err(DecompressError::UncompressedSizeDiffers { expected, actual }) => {
            Err(StoreError::SizeMismatch {
                declared: expected,
                actual,
            })
        }
        Err(DecompressError::OutputTooSmall { expected, .. }) => Err(StoreError::SizeMismatch {
            declared: row.declared_size,
            actual: expected,
        }),
        Err(e) => Err(StoreError::Corrupt(e)),
    }
}

/// Compress for storage. The game stores rows raw when compression does not
/// shrink them, which is also what keeps the raw/compressed distinction
/// unambiguous: a stored length equal to the declared size means raw.
fn pack_row(raw: &[u8]) -> Vec<u8> {
    let compressed = lz4_flex::compress(raw);
    if compressed.len() < raw.len() {
        compressed
    } else {
        raw.to_vec()
    }
}

fn sql_err(e: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, _) = &e {
        if matches!(
            code.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        ) {
            return StoreError::Locked;
        }
    }
    StoreError::Sqlite(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{PROFILE_CAT, TEAM_CATS, WINNING_TEAMS};
    use std::path::PathBuf;

    fn create_save(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("slot_1.sav");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE cats (key INTEGER PRIMARY KEY, data BLOB, size INTEGER);
             CREATE TABLE files (key TEXT PRIMARY KEY, data BLOB, size INTEGER);
             CREATE TABLE winning_teams (key INTEGER PRIMARY KEY, data BLOB, size INTEGER);",
        )
        .unwrap();
        path
    }

    fn insert_compressed(path: &Path, table: &str, key: &dyn ToSql, raw: &[u8]) {
        let conn = Connection::open(path).unwrap();
        let sql = format!("INSERT INTO {table} (key, data, size) VALUES (?1, ?2, ?3)");
        conn.execute(
            &sql,
            params![key, lz4_flex::compress(raw), raw.len() as i64],
        )
        .unwrap();
    }

    fn fetch_row(path: &Path, table: &str, key: &dyn ToSql) -> (Vec<u8>, i64) {
        let conn = Connection::open(path).unwrap();
        let sql = format!("SELECT data, size FROM {table} WHERE key = ?1");
        conn.query_row(&sql, params![key], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
    }

    // long runs compress well, so these rows are genuinely stored compressed
    fn squishy(len: usize) -> Vec<u8> {
        vec![7u8; len]
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let err = SaveStore::open("/nonexistent/slot_9.sav").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn open_rejects_unrelated_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.sav");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY)")
            .unwrap();
        drop(conn);

        let err = SaveStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSave(_)));
    }

    #[test]
    fn lists_rows_across_categories() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_save(&dir);
        insert_compressed(&path, "cats", &1i64, &squishy(200));
        insert_compressed(&path, "cats", &2i64, &squishy(300));
        insert_compressed(&path, "files", &"save_file_cat", &squishy(150));
        insert_compressed(&path, "files", &"settings", &squishy(80));
        insert_compressed(&path, "winning_teams", &10i64, &squishy(400));

        let store = SaveStore::open_read_only(&path).unwrap();
        let rows = store.list_cat_rows().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].category.id, "team_cats");
        assert_eq!(rows[0].key, RowKey::Int(1));
        assert_eq!(rows[2].category.id, "profile_cat");
        assert_eq!(rows[2].key, RowKey::Text("save_file_cat".to_string()));
        assert_eq!(rows[3].category.id, "winning_teams");

        // the settings row in `files` is not a cat
        assert!(!rows
            .iter()
            .any(|r| r.key == RowKey::Text("settings".to_string())));
    }

    #[test]
    fn missing_table_yields_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.sav");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE cats (key INTEGER PRIMARY KEY, data BLOB, size INTEGER)")
            .unwrap();
        drop(conn);

        let store = SaveStore::open(&path).unwrap();
        assert!(store.rows(&WINNING_TEAMS).unwrap().is_empty());
    }

    #[test]
    fn null_and_empty_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_save(&dir);
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO cats (key, data, size) VALUES (1, NULL, NULL)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO cats (key, data, size) VALUES (2, x'', 0)",
            [],
        )
        .unwrap();
        drop(conn);

        let store = SaveStore::open(&path).unwrap();
        assert!(store.rows(&TEAM_CATS).unwrap().is_empty());
    }

    #[test]
    fn read_blob_decompresses_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_save(&dir);
        let raw = squishy(256);
        insert_compressed(&path, "cats", &1i64, &raw);

        let store = SaveStore::open(&path).unwrap();
        let rows = store.rows(&TEAM_CATS).unwrap();
        assert!(rows[0].data.len() < raw.len());
        assert_eq!(read_blob(&rows[0]).unwrap(), raw);
    }

    #[test]
    fn read_blob_passes_raw_rows_through() {
        let raw: Vec<u8> = (0u8..16).collect();
        let row = CatRow {
            category: &TEAM_CATS,
            key: RowKey::Int(1),
            data: raw.clone(),
            declared_size: raw.len(),
        };
        assert_eq!(read_blob(&row).unwrap(), raw);
    }

    #[test]
    fn size_mismatch_when_declared_too_large() {
        let row = CatRow {
            category: &TEAM_CATS,
            key: RowKey::Int(1),
            data: lz4_flex::compress(&squishy(256)),
            declared_size: 300,
        };
        let err = read_blob(&row).unwrap_err();
        assert!(matches!(
            err,
            StoreError::SizeMismatch {
                declared: 300,
                actual: 256,
            }
        ));
    }

    #[test]
    fn size_mismatch_when_declared_too_small() {
        let row = CatRow {
            category: &TEAM_CATS,
            key: RowKey::Int(1),
            data: lz4_flex::compress(&squishy(256)),
            declared_size: 100,
        };
        let err = read_blob(&row).unwrap_err();
        assert!(matches!(
            err,
            StoreError::SizeMismatch { declared: 100, .. }
        ));
    }

    #[test]
    fn garbage_block_is_corrupt() {
        let row = CatRow {
            category: &TEAM_CATS,
            key: RowKey::Int(1),
            data: vec![0xF0, 0xFF, 0xFF, 0xFF],
            declared_size: 1000,
        };
        let err = read_blob(&row).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn write_blob_roundtrips_and_returns_previous_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_save(&dir);
        let original = squishy(200);
        insert_compressed(&path, "cats", &1i64, &original);
        insert_compressed(&path, "cats", &2i64, &squishy(300));

        let mut store = SaveStore::open(&path).unwrap();
        let row = store.rows(&TEAM_CATS).unwrap().remove(0);
        let new_raw = vec![9u8; 220];
        let previous = store.write_blob(&row, &new_raw).unwrap();
        assert_eq!(previous, lz4_flex::compress(&original));
        drop(store);

        let store = SaveStore::open(&path).unwrap();
        let rows = store.rows(&TEAM_CATS).unwrap();
        assert_eq!(rows[0].declared_size, 220);
        assert_eq!(read_blob(&rows[0]).unwrap(), new_raw);
        // the neighbouring row is untouched
        assert_eq!(read_blob(&rows[1]).unwrap(), squishy(300));
    }

    #[test]
    fn incompressible_rows_are_stored_raw() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_save(&dir);
        insert_compressed(&path, "cats", &1i64, &squishy(64));

        let mut store = SaveStore::open(&path).unwrap();
        let row = store.rows(&TEAM_CATS).unwrap().remove(0);
        let raw: Vec<u8> = (0u8..16).collect();
        store.write_blob(&row, &raw).unwrap();
        drop(store);

        let (data, size) = fetch_row(&path, "cats", &1i64);
        assert_eq!(data, raw);
        assert_eq!(size, 16);
    }

    #[test]
    fn write_to_missing_row_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_save(&dir);

        let mut store = SaveStore::open(&path).unwrap();
        let row = CatRow {
            category: &TEAM_CATS,
            key: RowKey::Int(999),
            data: Vec::new(),
            declared_size: 0,
        };
        let err = store.write_blob(&row, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn locked_database_fails_fast_and_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_save(&dir);
        let original = squishy(200);
        insert_compressed(&path, "cats", &1i64, &original);

        let mut store = SaveStore::open(&path).unwrap();
        let row = store.rows(&TEAM_CATS).unwrap().remove(0);

        let holder = Connection::open(&path).unwrap();
        holder.execute_batch("BEGIN EXCLUSIVE").unwrap();
        let err = store.write_blob(&row, &[1u8; 50]).unwrap_err();
        assert!(matches!(err, StoreError::Locked));
        holder.execute_batch("COMMIT").unwrap();

        let rows = store.rows(&TEAM_CATS).unwrap();
        assert_eq!(read_blob(&rows[0]).unwrap(), original);
    }

    #[test]
    fn tampered_write_rolls_back_completely() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_save(&dir);
        let original = squishy(200);
        insert_compressed(&path, "cats", &1i64, &original);

        // sabotage the size column on every update so read-back fails
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER tamper AFTER UPDATE ON cats BEGIN
                 UPDATE cats SET size = size + 1 WHERE key = NEW.key;
             END;",
        )
        .unwrap();
        drop(conn);

        let mut store = SaveStore::open(&path).unwrap();
        let row = store.rows(&TEAM_CATS).unwrap().remove(0);
        let err = store.write_blob(&row, &squishy(210)).unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected(_)));
        drop(store);

        // the failed transaction left no trace
        let (data, size) = fetch_row(&path, "cats", &1i64);
        assert_eq!(data, lz4_flex::compress(&original));
        assert_eq!(size, 200);
    }

    #[test]
    fn profile_cat_filter_only_sees_its_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_save(&dir);
        insert_compressed(&path, "files", &"save_file_cat", &squishy(100));
        insert_compressed(&path, "files", &"achievements", &squishy(100));

        let store = SaveStore::open(&path).unwrap();
        let rows = store.rows(&PROFILE_CAT).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, RowKey::Text("save_file_cat".to_string()));
    }
}
