//! Trailing chunk index: an 8-byte list header followed by one 20-byte entry
//! per chunk, all little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use std::ops::Range;

use crate::preset::PresetError;
use crate::tag::FourCc;

/// list tag (4) + entry count (4).
pub const CHUNKLIST_HEADER_SIZE: usize = 8;
/// chunk id (4) + offset (8) + size (8).
pub const CHUNK_ENTRY_SIZE:      usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkListHeader {
    pub list_id:     FourCc,
    pub entry_count: i32,
}

impl ChunkListHeader {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.list_id.as_bytes())?;
        writer.write_i32::<LittleEndian>(self.entry_count)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut list_id = [0u8; 4];
        reader.read_exact(&mut list_id)?;
        Ok(Self {
            list_id:     FourCc(list_id),
            entry_count: reader.read_i32::<LittleEndian>()?,
        })
    }

    /// Entry count as a length, rejecting negative values.
    pub fn len(&self) -> Result<usize, PresetError> {
        usize::try_from(self.entry_count).map_err(|_| PresetError::InvalidLength {
            field: "entry count",
            value: self.entry_count.into(),
        })
    }
}

/// One row of the chunk index.  Offsets are absolute from the start of file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    pub id:     FourCc,
    pub offset: i64,
    pub size:   i64,
}

impl ChunkEntry {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.id.as_bytes())?;
        writer.write_i64::<LittleEndian>(self.offset)?;
        writer.write_i64::<LittleEndian>(self.size)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut id = [0u8; 4];
        reader.read_exact(&mut id)?;
        Ok(Self {
            id:     FourCc(id),
            offset: reader.read_i64::<LittleEndian>()?,
            size:   reader.read_i64::<LittleEndian>()?,
        })
    }

    /// Byte range covered by the chunk.  Not checked against any buffer.
    pub fn range(&self) -> Result<Range<usize>, PresetError> {
        let start = to_len("chunk offset", self.offset)?;
        to_len("chunk size", self.size)?;
        let end = self.offset.checked_add(self.size).ok_or(PresetError::InvalidLength {
            field: "chunk size",
            value: self.size,
        })?;
        Ok(start..to_len("chunk end", end)?)
    }
}

pub(crate) fn to_len(field: &'static str, value: i64) -> Result<usize, PresetError> {
    usize::try_from(value).map_err(|_| PresetError::InvalidLength { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::COMP;

    #[test]
    fn entry_layout_is_20_bytes() {
        let entry = ChunkEntry { id: COMP, offset: 48, size: 10 };
        let mut buf = Vec::new();
        entry.write(&mut buf).unwrap();
        assert_eq!(buf.len(), CHUNK_ENTRY_SIZE);
        assert_eq!(&buf[..4], b"Comp");
        assert_eq!(ChunkEntry::read(&buf[..]).unwrap(), entry);
        assert_eq!(entry.range().unwrap(), 48..58);
    }

    #[test]
    fn negative_fields_are_invalid_lengths() {
        let entry = ChunkEntry { id: COMP, offset: -1, size: 10 };
        assert!(matches!(entry.range(), Err(PresetError::InvalidLength { field: "chunk offset", .. })));

        let entry = ChunkEntry { id: COMP, offset: 48, size: -10 };
        assert!(matches!(entry.range(), Err(PresetError::InvalidLength { field: "chunk size", .. })));

        let header = ChunkListHeader { list_id: FourCc(*b"List"), entry_count: -3 };
        assert!(matches!(header.len(), Err(PresetError::InvalidLength { value: -3, .. })));
    }

    #[test]
    fn overflowing_range_is_rejected() {
        let entry = ChunkEntry { id: COMP, offset: i64::MAX - 4, size: 16 };
        assert!(matches!(entry.range(), Err(PresetError::InvalidLength { .. })));
    }
}
