//! Four-byte tags used for the container header, the chunk list and every
//! chunk id.
//!
//! Tags have no length prefix on disk.  Textual tags shorter than four bytes
//! are right-padded with ASCII spaces (`"Inf"` → `b"Inf "`), the usual FourCC
//! convention.  Tags read from a file are kept verbatim, whatever they contain.

use std::fmt;
use std::str::FromStr;

use crate::preset::PresetError;

/// Byte used to pad textual tags shorter than four bytes.
pub const TAG_PAD: u8 = b' ';

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCc(pub [u8; 4]);

/// Container format tag written at offset 0.
pub const HEADER_ID:    FourCc = FourCc(*b"VST3");
/// Chunk-list section tag.
pub const CHUNKLIST_ID: FourCc = FourCc(*b"List");
/// Reserved chunk holding the component (processor) state.
pub const COMP:         FourCc = FourCc(*b"Comp");
/// Controller (edit controller) state.
pub const CONT:         FourCc = FourCc(*b"Cont");
/// Free-form preset meta information.
pub const INFO:         FourCc = FourCc(*b"Info");

impl FourCc {
    /// Build a tag from its textual form, applying the space padding rule.
    pub fn new(text: &str) -> Result<Self, PresetError> {
        let bytes = text.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 {
            return Err(PresetError::InvalidTag(text.to_owned()));
        }
        let mut tag = [TAG_PAD; 4];
        tag[..bytes.len()].copy_from_slice(bytes);
        Ok(FourCc(tag))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for FourCc {
    fn from(bytes: [u8; 4]) -> Self {
        FourCc(bytes)
    }
}

impl From<&[u8; 4]> for FourCc {
    fn from(bytes: &[u8; 4]) -> Self {
        FourCc(*bytes)
    }
}

impl FromStr for FourCc {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FourCc::new(s)
    }
}

/// Lossy text form, for presentation only.
impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({:?})", String::from_utf8_lossy(&self.0))
    }
}
