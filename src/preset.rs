//! In-memory preset container and its binary codec.
//!
//! ```text
//! 0   +------------------------------+
//!     | HEADER                       |
//!     |   header id ('VST3')    4 B  |
//!     |   version (i32)         4 B  |
//!     |   class id             32 B  |
//! +---|   chunk-list offset     8 B  |
//! |   +------------------------------+
//! |   | DATA AREA                    |<--+
//! |   |   chunk 1..n, contiguous     |   |
//! +-->+------------------------------+   |
//!     | CHUNK LIST                   |   |
//!     |   list id ('List')      4 B  |   |
//!     |   entry count (i32)     4 B  |   |
//!     |   1..n: id              4 B  |   |
//!     |         offset (i64)    8 B  |---+
//!     |         size (i64)      8 B  |
//! EOF +------------------------------+
//! ```
//!
//! Everything is little-endian.  The chunk order of the map is the on-disk
//! order of both the data area and the index.

use indexmap::IndexMap;
use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::chunklist::{
    to_len, ChunkEntry, ChunkListHeader, CHUNKLIST_HEADER_SIZE, CHUNK_ENTRY_SIZE,
};
use crate::header::{ClassId, PresetHeader, HEADER_SIZE};
use crate::tag::{FourCc, CHUNKLIST_ID, COMP, CONT, HEADER_ID, INFO};

/// Default container version written by new presets.
pub const DEFAULT_VERSION: i32 = 1;

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Malformed header: need {HEADER_SIZE} bytes, got {len}")]
    MalformedHeader { len: usize },
    #[error("Malformed chunk list at offset {offset} (buffer is {len} bytes)")]
    MalformedChunklist { offset: i64, len: usize },
    #[error("Chunk '{id}' at offset {offset} with size {size} exceeds buffer of {len} bytes")]
    TruncatedChunk { id: FourCc, offset: i64, size: i64, len: usize },
    #[error("Invalid {field}: {value}")]
    InvalidLength { field: &'static str, value: i64 },
    #[error("Class id is {len} bytes long; the header field holds at most 32")]
    IdentifierTooLong { len: usize },
    #[error("Invalid tag {0:?}: expected 1 to 4 bytes")]
    InvalidTag(String),
    #[error("Parameter block of {0} bytes is not a whole number of records")]
    MalformedParameters(usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct Preset {
    pub header_id:        FourCc,
    pub version:          i32,
    pub class_id:         ClassId,
    /// Offset found by [`Preset::decode`].  Informational; `encode` always
    /// recomputes it.
    pub chunklist_offset: i64,
    pub chunklist_id:     FourCc,
    pub chunks:           IndexMap<FourCc, Vec<u8>>,
}

impl Preset {
    pub fn new(class_id: impl Into<ClassId>) -> Self {
        Self {
            header_id:        HEADER_ID,
            version:          DEFAULT_VERSION,
            class_id:         class_id.into(),
            chunklist_offset: 0,
            chunklist_id:     CHUNKLIST_ID,
            chunks:           IndexMap::new(),
        }
    }

    /// Insert or overwrite a chunk.  An existing id keeps its position.
    pub fn insert_chunk(&mut self, id: FourCc, data: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.chunks.insert(id, data.into())
    }

    pub fn chunk(&self, id: &FourCc) -> Option<&[u8]> {
        self.chunks.get(id).map(Vec::as_slice)
    }

    pub fn comp(&self) -> &[u8] {
        self.chunk(&COMP).unwrap_or_default()
    }

    pub fn cont(&self) -> &[u8] {
        self.chunk(&CONT).unwrap_or_default()
    }

    pub fn info(&self) -> &[u8] {
        self.chunk(&INFO).unwrap_or_default()
    }

    /// Total size of the data area.
    pub fn data_len(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    /// The chunk index `encode` would write, in insertion order.
    pub fn chunk_entries(&self) -> Result<Vec<ChunkEntry>, PresetError> {
        let mut offset = HEADER_SIZE;
        let mut entries = Vec::with_capacity(self.chunks.len());
        for (id, data) in &self.chunks {
            entries.push(ChunkEntry {
                id:     *id,
                offset: to_i64("chunk offset", offset)?,
                size:   to_i64("chunk size", data.len())?,
            });
            offset += data.len();
        }
        Ok(entries)
    }

    // ── Decode ───────────────────────────────────────────────────────────────

    /// Parse a complete container.  Every offset and size is bounds-checked
    /// against `buf`; nothing is returned on error.
    pub fn decode(buf: &[u8]) -> Result<Self, PresetError> {
        Self::decode_with_index(buf).map(|(preset, _)| preset)
    }

    /// Like [`Preset::decode`], also returning the chunk index exactly as
    /// stored in the file, duplicates and gaps included.
    pub fn decode_with_index(buf: &[u8]) -> Result<(Self, Vec<ChunkEntry>), PresetError> {
        if buf.len() < HEADER_SIZE {
            return Err(PresetError::MalformedHeader { len: buf.len() });
        }
        let header = PresetHeader::read(&buf[..HEADER_SIZE])?;

        let malformed = || PresetError::MalformedChunklist {
            offset: header.chunklist_offset,
            len:    buf.len(),
        };
        let list_start = to_len("chunk-list offset", header.chunklist_offset)?;
        let list = buf
            .get(list_start..)
            .filter(|rest| rest.len() >= CHUNKLIST_HEADER_SIZE)
            .ok_or_else(malformed)?;
        let list_header = ChunkListHeader::read(&list[..CHUNKLIST_HEADER_SIZE])?;

        let count = list_header.len()?;
        let table_len = count
            .checked_mul(CHUNK_ENTRY_SIZE)
            .ok_or(PresetError::InvalidLength {
                field: "entry count",
                value: list_header.entry_count.into(),
            })?;
        let table = list[CHUNKLIST_HEADER_SIZE..]
            .get(..table_len)
            .ok_or_else(malformed)?;

        let mut chunks = IndexMap::with_capacity(count);
        let mut entries = Vec::with_capacity(count);
        for row in table.chunks_exact(CHUNK_ENTRY_SIZE) {
            let entry = ChunkEntry::read(row)?;
            let data = buf.get(entry.range()?).ok_or(PresetError::TruncatedChunk {
                id:     entry.id,
                offset: entry.offset,
                size:   entry.size,
                len:    buf.len(),
            })?;
            chunks.insert(entry.id, data.to_vec());
            entries.push(entry);
        }

        let preset = Self {
            header_id:        header.header_id,
            version:          header.version,
            class_id:         ClassId::from_bytes(&header.class_id),
            chunklist_offset: header.chunklist_offset,
            chunklist_id:     list_header.list_id,
            chunks,
        };
        Ok((preset, entries))
    }

    // ── Encode ───────────────────────────────────────────────────────────────

    /// Serialize the container.  Offsets are derived from the chunk map;
    /// `self.chunklist_offset` is not consulted.
    pub fn encode(&self) -> Result<Vec<u8>, PresetError> {
        let class_id = self.class_id.to_field()?;
        let entries = self.chunk_entries()?;
        let data_len = self.data_len();
        let entry_count = i32::try_from(entries.len()).map_err(|_| PresetError::InvalidLength {
            field: "entry count",
            value: entries.len() as i64,
        })?;

        let mut out = Vec::with_capacity(
            HEADER_SIZE + data_len + CHUNKLIST_HEADER_SIZE + entries.len() * CHUNK_ENTRY_SIZE,
        );
        PresetHeader {
            header_id:        self.header_id,
            version:          self.version,
            class_id,
            chunklist_offset: to_i64("chunk-list offset", HEADER_SIZE + data_len)?,
        }
        .write(&mut out)?;
        for data in self.chunks.values() {
            out.extend_from_slice(data);
        }
        ChunkListHeader { list_id: self.chunklist_id, entry_count }.write(&mut out)?;
        for entry in &entries {
            entry.write(&mut out)?;
        }
        Ok(out)
    }

    // ── Files ────────────────────────────────────────────────────────────────

    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, PresetError> {
        Self::decode(&std::fs::read(path)?)
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PresetError> {
        let bytes = self.encode()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Two presets are equal when they encode to the same bytes: chunk order
/// matters, the informational `chunklist_offset` does not.
impl PartialEq for Preset {
    fn eq(&self, other: &Self) -> bool {
        self.header_id == other.header_id
            && self.version == other.version
            && self.class_id == other.class_id
            && self.chunklist_id == other.chunklist_id
            && self.chunks.iter().eq(other.chunks.iter())
    }
}

impl Eq for Preset {}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "header_id={}, class={}", self.header_id, self.class_id)?;
        for (id, data) in &self.chunks {
            write!(f, "; Chunk '{}': {} bytes", id, data.len())?;
        }
        Ok(())
    }
}

fn to_i64(field: &'static str, value: usize) -> Result<i64, PresetError> {
    i64::try_from(value).map_err(|_| PresetError::InvalidLength { field, value: i64::MAX })
}
