//! Cat record decoding and encoding.
//!
//! Records are walked against a declarative field layout (see
//! [`crate::registry`] for the shipped layouts). Every decoded field keeps
//! the exact bytes it was read from, so encoding is pure concatenation and a
//! record that was not modified always re-encodes byte-identical, including
//! fields the walker does not understand.
//!
//! # Cat record layout (decompressed)
//!
//! | Offset | Size | Field                                      |
//! |--------|------|--------------------------------------------|
//! | 0      | 4    | Magic (u32 LE, `0x13`)                     |
//! | 4      | 8    | Generation seed (opaque)                   |
//! | 12     | 4    | Name length in UTF-16 code units (u32 LE)  |
//! | 16     | 4    | Reserved (u32 LE)                          |
//! | 20     | 2*n  | Name, UTF-16LE                             |
//! | 20+2*n | ...  | Stats and abilities (opaque)               |

use thiserror::Error;

use crate::registry;

/// Longest name-length prefix accepted before a record is treated as
/// corrupt. The game itself never writes names anywhere near this.
pub const MAX_NAME_UNITS: usize = 500;

/// Errors that can occur while decoding a record
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("record truncated: field `{field}` needs {needed} bytes, {remaining} remain")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("field `{field}` declares a malformed length of {length}")]
    MalformedLength { field: &'static str, length: usize },

    #[error("unknown record category: {0}")]
    UnknownCategory(String),

    #[error("bad record magic: expected {expected:#06x}, found {found:#06x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("record has {0} bytes past the end of its layout")]
    TrailingBytes(usize),
}

/// Text encoding of a name field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-16 little-endian, two bytes per code unit
    Utf16Le,
    /// One byte per character
    Ascii,
}

impl Encoding {
    /// Bytes per code unit
    pub fn unit_width(self) -> usize {
        match self {
            Encoding::Utf16Le => 2,
            Encoding::Ascii => 1,
        }
    }

    /// Number of code units `text` occupies in this encoding
    pub fn unit_count(self, text: &str) -> usize {
        match self {
            Encoding::Utf16Le => text.encode_utf16().count(),
            Encoding::Ascii => text.len(),
        }
    }

    /// Encode `text` to raw bytes. Callers validate ASCII-ness first.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf16Le => text
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes())
                .collect(),
            Encoding::Ascii => text.bytes().collect(),
        }
    }

    fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Encoding::Ascii => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Field descriptor kinds understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Fixed u32 LE constant, checked on decode
    Magic(u32),
    /// Little-endian unsigned integer of `width` bytes
    Uint { width: usize },
    /// Opaque fixed-size byte run
    Bytes { len: usize },
    /// Fixed-capacity name slot, padded to `capacity` bytes
    FixedName {
        capacity: usize,
        encoding: Encoding,
        pad: u8,
    },
    /// u32 LE length prefix counted in code units, `reserved` opaque bytes,
    /// then the name itself
    PrefixedName { encoding: Encoding, reserved: usize },
    /// Everything to the end of the record. Must be the last field.
    Tail,
}

/// One field in a record layout
#[derive(Debug)]
pub struct FieldSpec {
    pub id: &'static str,
    pub kind: FieldKind,
}

/// Ordered field layout for one record category
#[derive(Debug)]
pub struct RecordLayout {
    pub id: &'static str,
    pub fields: &'static [FieldSpec],
}

/// A decoded name plus the padding captured around it, so a rename can
/// reproduce the slot byte-for-byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameField {
    pub text: String,
    /// Byte used to fill the rest of a fixed slot
    pub pad_byte: u8,
    /// How many padding bytes followed the name at decode time
    pub pad_len: usize,
}

/// Typed view of a decoded field
#[derive(Debug, Clone)]
pub enum FieldValue {
    Uint(u64),
    /// Opaque bytes; the data lives in [`Field::raw`]
    Bytes,
    Name(NameField),
    Tail,
}

/// One decoded field: its descriptor, position, exact source bytes, and
/// typed view
#[derive(Debug, Clone)]
pub struct Field {
    pub spec: &'static FieldSpec,
    pub offset: usize,
    pub raw: Vec<u8>,
    pub value: FieldValue,
}

/// A decoded record.
///
/// Encoding a record that was not modified reproduces the exact bytes it was
/// decoded from, even when some of those bytes are opaque to the layout.
#[derive(Debug, Clone)]
pub struct Record {
    layout: &'static RecordLayout,
    fields: Vec<Field>,
    raw_len: usize,
}

impl Record {
    /// The layout this record was decoded against
    pub fn layout(&self) -> &'static RecordLayout {
        self.layout
    }

    /// All decoded fields, in layout order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Length in bytes of the encoded record
    pub fn raw_len(&self) -> usize {
        self.raw_len
    }

    /// Look up a field by its layout id
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.spec.id == id)
    }

    /// Integer value of a `Magic` or `Uint` field
    pub fn uint(&self, id: &str) -> Option<u64> {
        match &self.field(id)?.value {
            FieldValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// Decoded name field, if `id` names one
    pub fn name(&self, id: &str) -> Option<&NameField> {
        match &self.field(id)?.value {
            FieldValue::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Text of the first name field in the record
    pub fn display_name(&self) -> Option<&str> {
        self.fields.iter().find_map(|f| match &f.value {
            FieldValue::Name(name) => Some(name.text.as_str()),
            _ => None,
        })
    }

    /// Serialize the record back to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.raw_len);
        for field in &self.fields {
            out.extend_from_slice(&field.raw);
        }
        out
    }

    /// Rebuild the record with one field's bytes replaced, shifting the
    /// offsets of everything after it
    pub(crate) fn with_field(&self, index: usize, raw: Vec<u8>, value: FieldValue) -> Record {
        let mut fields = self.fields.clone();
        fields[index].raw = raw;
        fields[index].value = value;
        let mut pos = fields[index].offset;
        for field in &mut fields[index..] {
            field.offset = pos;
            pos += field.raw.len();
        }
        Record {
            layout: self.layout,
            fields,
            raw_len: pos,
        }
    }

    pub(crate) fn field_index(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.spec.id == id)
    }
}

/// Decode `bytes` against the layout registered under `category`
pub fn decode(category: &str, bytes: &[u8]) -> Result<Record, DecodeError> {
    let layout = registry::record_layout(category)
        .ok_or_else(|| DecodeError::UnknownCategory(category.to_string()))?;
    layout.decode(bytes)
}

impl RecordLayout {
    /// Walk `bytes` field by field and build a [`Record`]
    pub fn decode(&'static self, bytes: &[u8]) -> Result<Record, DecodeError> {
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut pos = 0usize;

        for spec in self.fields {
            let field = match spec.kind {
                FieldKind::Magic(expected) => {
                    let raw = take(bytes, pos, 4, spec.id)?;
                    let found = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                    if found != expected {
                        return Err(DecodeError::BadMagic { expected, found });
                    }
                    Field {
                        spec,
                        offset: pos,
                        raw: raw.to_vec(),
                        value: FieldValue::Uint(u64::from(found)),
                    }
                }
                FieldKind::Uint { width } => {
                    let raw = take(bytes, pos, width, spec.id)?;
                    let mut value = 0u64;
                    for (i, byte) in raw.iter().enumerate() {
                        value |= u64::from(*byte) << (8 * i);
                    }
                    Field {
                        spec,
                        offset: pos,
                        raw: raw.to_vec(),
                        value: FieldValue::Uint(value),
                    }
                }
                FieldKind::Bytes { len } => {
                    let raw = take(bytes, pos, len, spec.id)?;
                    Field {
                        spec,
                        offset: pos,
                        raw: raw.to_vec(),
                        value: FieldValue::Bytes,
                    }
                }
                FieldKind::FixedName {
                    capacity,
                    encoding,
                    pad,
                } => {
                    let raw = take(bytes, pos, capacity, spec.id)?;
                    let name = decode_fixed_name(raw, encoding, pad);
                    Field {
                        spec,
                        offset: pos,
                        raw: raw.to_vec(),
                        value: FieldValue::Name(name),
                    }
                }
                FieldKind::PrefixedName { encoding, reserved } => {
                    let head = take(bytes, pos, 4 + reserved, spec.id)?;
                    let units =
                        u32::from_le_bytes([head[0], head[1], head[2], head[3]]) as usize;
                    if units > MAX_NAME_UNITS {
                        return Err(DecodeError::MalformedLength {
                            field: spec.id,
                            length: units,
                        });
                    }
                    let name_bytes = units * encoding.unit_width();
                    if name_bytes > bytes.len() - (pos + 4 + reserved) {
                        return Err(DecodeError::MalformedLength {
                            field: spec.id,
                            length: units,
                        });
                    }
                    let raw = &bytes[pos..pos + 4 + reserved + name_bytes];
                    let text = encoding.decode(&raw[4 + reserved..]);
                    Field {
                        spec,
                        offset: pos,
                        raw: raw.to_vec(),
                        value: FieldValue::Name(NameField {
                            text,
                            pad_byte: 0,
                            pad_len: 0,
                        }),
                    }
                }
                FieldKind::Tail => Field {
                    spec,
                    offset: pos,
                    raw: bytes[pos..].to_vec(),
                    value: FieldValue::Tail,
                },
            };
            pos += field.raw.len();
            fields.push(field);
        }

        if pos != bytes.len() {
            return Err(DecodeError::TrailingBytes(bytes.len() - pos));
        }

        Ok(Record {
            layout: self,
            fields,
            raw_len: bytes.len(),
        })
    }
}

fn take<'a>(
    bytes: &'a [u8],
    pos: usize,
    len: usize,
    field: &'static str,
) -> Result<&'a [u8], DecodeError> {
    if bytes.len() - pos < len {
        return Err(DecodeError::Truncated {
            field,
            needed: len,
            remaining: bytes.len() - pos,
        });
    }
    Ok(&bytes[pos..pos + len])
}

/// Split a fixed name slot into text and trailing padding. Padding is
/// stripped a whole code unit at a time so UTF-16 names survive.
fn decode_fixed_name(raw: &[u8], encoding: Encoding, pad: u8) -> NameField {
    let unit = encoding.unit_width();
    let mut end = raw.len();
    while end >= unit && raw[end - unit..end].iter().all(|&b| b == pad) {
        end -= unit;
    }
    NameField {
        text: encoding.decode(&raw[..end]),
        pad_byte: pad,
        pad_len: raw.len() - end,
    }
}
