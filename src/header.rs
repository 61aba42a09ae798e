use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, Read, Write};
use uuid::Uuid;

use crate::preset::PresetError;
use crate::tag::FourCc;

/// Width of the class id field in the header.
pub const CLASS_ID_LEN: usize = 32;
/// tag (4) + version (4) + class id (32) + chunk-list offset (8).
pub const HEADER_SIZE:  usize = 48;
/// Byte offset of the chunk-list offset field.
pub const CHUNKLIST_OFFSET_POS: usize = 4 + 4 + CLASS_ID_LEN;

/// Identifier of the target plugin class.
///
/// Holds the bytes as supplied; a decoded id holds all 32 raw bytes including
/// the zero padding.  Equality ignores trailing zero bytes, so `"AB"` and
/// `"AB"` + 30 NULs compare equal.
#[derive(Clone, Default)]
pub struct ClassId(Vec<u8>);

impl ClassId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        ClassId(bytes.to_vec())
    }

    /// Raw bytes, padding included when the id came from a file.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Bytes with trailing zero padding stripped.
    pub fn logical(&self) -> &[u8] {
        let end = self.0.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        &self.0[..end]
    }

    /// Logical identifier as text (lossy).
    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(self.logical()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.logical().is_empty()
    }

    /// Pack into the fixed header field, zero-padded on the right.
    pub fn to_field(&self) -> Result<[u8; CLASS_ID_LEN], PresetError> {
        if self.0.len() > CLASS_ID_LEN {
            return Err(PresetError::IdentifierTooLong { len: self.0.len() });
        }
        let mut field = [0u8; CLASS_ID_LEN];
        field[..self.0.len()].copy_from_slice(&self.0);
        Ok(field)
    }

    /// Interpret a 32-hex-digit id as a GUID.  Presentation only.
    pub fn as_uuid(&self) -> Option<Uuid> {
        let text = std::str::from_utf8(self.logical()).ok()?;
        if text.len() != CLASS_ID_LEN {
            return None;
        }
        Uuid::try_parse(text).ok()
    }
}

impl From<&str> for ClassId {
    fn from(s: &str) -> Self {
        ClassId(s.as_bytes().to_vec())
    }
}

impl From<String> for ClassId {
    fn from(s: String) -> Self {
        ClassId(s.into_bytes())
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.logical() == other.logical()
    }
}

impl Eq for ClassId {}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({:?})", self.as_str())
    }
}

/// Fixed 48-byte prefix of every container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetHeader {
    pub header_id:        FourCc,
    pub version:          i32,
    pub class_id:         [u8; CLASS_ID_LEN],
    pub chunklist_offset: i64,
}

impl PresetHeader {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.header_id.as_bytes())?;
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_all(&self.class_id)?;
        writer.write_i64::<LittleEndian>(self.chunklist_offset)?;
        Ok(())
    }

    /// Reads the fields as-is; the caller checks that `HEADER_SIZE` bytes are
    /// available.
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut header_id = [0u8; 4];
        reader.read_exact(&mut header_id)?;
        let version = reader.read_i32::<LittleEndian>()?;
        let mut class_id = [0u8; CLASS_ID_LEN];
        reader.read_exact(&mut class_id)?;
        let chunklist_offset = reader.read_i64::<LittleEndian>()?;
        Ok(Self {
            header_id: FourCc(header_id),
            version,
            class_id,
            chunklist_offset,
        })
    }
}
