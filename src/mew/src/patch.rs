//! Renaming: rebuild a record with one name field replaced.
//!
//! Patching never mutates the input record. On success a new [`Record`] is
//! returned in which only the target field's bytes changed; every other
//! field keeps its exact original bytes. On failure the caller still holds
//! the untouched original.

use thiserror::Error;

use crate::blob::{Encoding, FieldKind, FieldValue, NameField, Record, MAX_NAME_UNITS};

/// Errors that can occur while applying a name patch
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("name too long: needs {len} of {capacity} available units")]
    NameTooLong { len: usize, capacity: usize },

    #[error("name cannot be encoded: {0}")]
    InvalidEncoding(String),

    #[error("no such name field: {0}")]
    NoSuchField(String),
}

/// A requested rename: which field to replace, and the replacement text
#[derive(Debug, Clone)]
pub struct NamePatch<'a> {
    pub field: &'a str,
    pub new_name: &'a str,
}

/// Apply a rename to `record`, returning the patched copy.
///
/// Fixed-capacity name slots are re-padded to their full capacity, reusing
/// the padding byte observed at decode time. Length-prefixed names get a
/// recomputed prefix; the reserved bytes between prefix and text are carried
/// over verbatim.
pub fn apply_name_patch(record: &Record, patch: &NamePatch) -> Result<Record, PatchError> {
    let index = record
        .field_index(patch.field)
        .ok_or_else(|| PatchError::NoSuchField(patch.field.to_string()))?;
    let field = &record.fields()[index];

    if let Some(control) = patch.new_name.chars().find(|c| c.is_control()) {
        return Err(PatchError::InvalidEncoding(format!(
            "name contains control character {control:?}"
        )));
    }

    match field.spec.kind {
        FieldKind::FixedName {
            capacity,
            encoding,
            pad,
        } => {
            ensure_encodable(patch.new_name, encoding)?;
            let mut raw = encoding.encode(patch.new_name);
            if raw.len() > capacity {
                return Err(PatchError::NameTooLong {
                    len: raw.len(),
                    capacity,
                });
            }
            // keep whatever padding byte the record actually used
            let pad_byte = match &field.value {
                FieldValue::Name(old) if old.pad_len > 0 => old.pad_byte,
                _ => pad,
            };
            let pad_len = capacity - raw.len();
            raw.resize(capacity, pad_byte);
            let value = FieldValue::Name(NameField {
                text: patch.new_name.to_string(),
                pad_byte,
                pad_len,
            });
            Ok(record.with_field(index, raw, value))
        }
        FieldKind::PrefixedName { encoding, reserved } => {
            ensure_encodable(patch.new_name, encoding)?;
            let units = encoding.unit_count(patch.new_name);
            if units > MAX_NAME_UNITS {
                return Err(PatchError::NameTooLong {
                    len: units,
                    capacity: MAX_NAME_UNITS,
                });
            }
            let encoded = encoding.encode(patch.new_name);
            let mut raw = Vec::with_capacity(4 + reserved + encoded.len());
            raw.extend_from_slice(&(units as u32).to_le_bytes());
            raw.extend_from_slice(&field.raw[4..4 + reserved]);
            raw.extend_from_slice(&encoded);
            let value = FieldValue::Name(NameField {
                text: patch.new_name.to_string(),
                pad_byte: 0,
                pad_len: 0,
            });
            Ok(record.with_field(index, raw, value))
        }
        _ => Err(PatchError::NoSuchField(format!(
            "`{}` is not a name field",
            patch.field
        ))),
    }
}

fn ensure_encodable(name: &str, encoding: Encoding) -> Result<(), PatchError> {
    if encoding == Encoding::Ascii && !name.is_ascii() {
        return Err(PatchError::InvalidEncoding(format!(
            "`{name}` contains characters outside ASCII"
        )));
    }
    Ok(())
}
