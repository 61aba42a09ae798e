//! Reader for VST2 program files (`.fxp`).
//!
//! All fields are big-endian.
//!
//! | Offset | Field        | Size |
//! |--------|--------------|------|
//! | 0      | `CcnK` magic | 4 B  |
//! | 4      | byte size    | 4 B  |
//! | 8      | fx magic     | 4 B  | `FxCk` params, `FPCh` opaque chunk
//! | 12     | version      | 4 B  |
//! | 16     | fx id        | 4 B  |
//! | 20     | fx version   | 4 B  |
//! | 24     | param count  | 4 B  |
//! | 28     | program name | 28 B |
//! | 56     | `FxCk`: count × f32 params; `FPCh`: i32 size + chunk bytes |
//!
//! Banks (`FxBk`, `FBCh`) are not programs and are rejected.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

use crate::legacy::LegacyPreset;
use crate::params::Parameter;
use crate::tag::FourCc;

pub const CHUNK_MAGIC:  &[u8; 4] = b"CcnK";
pub const FX_REGULAR:   &[u8; 4] = b"FxCk";
pub const FX_OPAQUE:    &[u8; 4] = b"FPCh";
pub const NAME_LEN:     usize = 28;
pub const FXP_HEADER_SIZE: usize = 56;

#[derive(Error, Debug)]
pub enum FxpError {
    #[error("Invalid magic number: {0}")]
    InvalidMagic(FourCc),
    #[error("Unsupported fx kind '{0}' (only single programs are supported)")]
    UnsupportedKind(FourCc),
    #[error("Invalid {field}: {value}")]
    InvalidLength { field: &'static str, value: i32 },
    #[error("File truncated: need {need} bytes, got {len}")]
    Truncated { need: usize, len: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FxpKind {
    Regular,
    Opaque,
}

#[derive(Debug, Clone)]
pub struct FxpPreset {
    pub kind:        FxpKind,
    pub version:     i32,
    pub plugin_id:   FourCc,
    pub fx_version:  i32,
    pub param_count: i32,
    pub name:        String,
    pub params:      Vec<Parameter>,
    pub data:        Option<Vec<u8>>,
}

impl FxpPreset {
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, FxpError> {
        Self::parse(&std::fs::read(path)?)
    }

    pub fn parse(buf: &[u8]) -> Result<Self, FxpError> {
        ensure_len(buf, FXP_HEADER_SIZE)?;
        let mut r = buf;

        let magic = read_tag(&mut r)?;
        if magic.as_bytes() != CHUNK_MAGIC {
            return Err(FxpError::InvalidMagic(magic));
        }
        let _byte_size = r.read_i32::<BigEndian>()?;
        let fx_magic = read_tag(&mut r)?;
        let kind = match fx_magic.as_bytes() {
            m if m == FX_REGULAR => FxpKind::Regular,
            m if m == FX_OPAQUE  => FxpKind::Opaque,
            _ => return Err(FxpError::UnsupportedKind(fx_magic)),
        };
        let version = r.read_i32::<BigEndian>()?;
        let plugin_id = read_tag(&mut r)?;
        let fx_version = r.read_i32::<BigEndian>()?;
        let param_count = r.read_i32::<BigEndian>()?;
        let mut name_field = [0u8; NAME_LEN];
        r.read_exact(&mut name_field)?;
        let name_end = name_field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let name = String::from_utf8_lossy(&name_field[..name_end]).into_owned();

        let (params, data) = match kind {
            FxpKind::Regular => {
                let count = to_len("param count", param_count)?;
                let need = count
                    .checked_mul(4)
                    .and_then(|n| n.checked_add(FXP_HEADER_SIZE))
                    .ok_or(FxpError::InvalidLength { field: "param count", value: param_count })?;
                ensure_len(buf, need)?;
                let mut params = Vec::with_capacity(count);
                for id in 0..count {
                    let value = r.read_f32::<BigEndian>()?;
                    params.push(Parameter::new(id as u32, f64::from(value)));
                }
                (params, None)
            }
            FxpKind::Opaque => {
                ensure_len(buf, FXP_HEADER_SIZE + 4)?;
                let chunk_size = r.read_i32::<BigEndian>()?;
                let size = to_len("chunk size", chunk_size)?;
                ensure_len(buf, FXP_HEADER_SIZE + 4 + size)?;
                (Vec::new(), Some(r[..size].to_vec()))
            }
        };

        Ok(Self { kind, version, plugin_id, fx_version, param_count, name, params, data })
    }
}

impl LegacyPreset for FxpPreset {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_opaque(&self) -> bool {
        self.kind == FxpKind::Opaque
    }

    fn is_regular(&self) -> bool {
        self.kind == FxpKind::Regular
    }

    fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }
}

fn read_tag(r: &mut &[u8]) -> io::Result<FourCc> {
    let mut tag = [0u8; 4];
    r.read_exact(&mut tag)?;
    Ok(FourCc(tag))
}

fn ensure_len(buf: &[u8], need: usize) -> Result<(), FxpError> {
    if buf.len() < need {
        return Err(FxpError::Truncated { need, len: buf.len() });
    }
    Ok(())
}

fn to_len(field: &'static str, value: i32) -> Result<usize, FxpError> {
    usize::try_from(value).map_err(|_| FxpError::InvalidLength { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn header(fx_magic: &[u8; 4], count: i32) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_all(CHUNK_MAGIC).unwrap();
        out.write_i32::<BigEndian>(0).unwrap();
        out.write_all(fx_magic).unwrap();
        out.write_i32::<BigEndian>(1).unwrap();
        out.write_all(b"Abcd").unwrap();
        out.write_i32::<BigEndian>(2).unwrap();
        out.write_i32::<BigEndian>(count).unwrap();
        let mut name = [0u8; NAME_LEN];
        name[..4].copy_from_slice(b"Init");
        out.write_all(&name).unwrap();
        out
    }

    #[test]
    fn regular_program_exposes_parameters() {
        let mut buf = header(FX_REGULAR, 3);
        for v in [0.0f32, 0.5, 1.0] {
            buf.write_f32::<BigEndian>(v).unwrap();
        }
        let fxp = FxpPreset::parse(&buf).unwrap();
        assert!(fxp.is_regular());
        assert!(!fxp.is_opaque());
        assert_eq!(fxp.name(), "Init");
        assert_eq!(fxp.plugin_id, FourCc(*b"Abcd"));
        assert_eq!(fxp.fx_version, 2);
        assert_eq!(
            fxp.parameters(),
            &[Parameter::new(0, 0.0), Parameter::new(1, 0.5), Parameter::new(2, 1.0)]
        );
        assert!(fxp.data().is_none());
    }

    #[test]
    fn opaque_program_exposes_blob() {
        let mut buf = header(FX_OPAQUE, 0);
        buf.write_i32::<BigEndian>(5).unwrap();
        buf.write_all(b"state").unwrap();
        let fxp = FxpPreset::parse(&buf).unwrap();
        assert!(fxp.is_opaque());
        assert_eq!(fxp.data(), Some(&b"state"[..]));
        assert!(fxp.parameters().is_empty());
    }

    #[test]
    fn malformed_programs_are_rejected() {
        assert!(matches!(FxpPreset::parse(b"CcnK"), Err(FxpError::Truncated { need: 56, len: 4 })));

        let mut bad = header(FX_REGULAR, 0);
        bad[..4].copy_from_slice(b"RIFF");
        assert!(matches!(FxpPreset::parse(&bad), Err(FxpError::InvalidMagic(_))));

        assert!(matches!(FxpPreset::parse(&header(b"FxBk", 0)), Err(FxpError::UnsupportedKind(_))));
        assert!(matches!(
            FxpPreset::parse(&header(FX_REGULAR, -1)),
            Err(FxpError::InvalidLength { value: -1, .. })
        ));
        assert!(matches!(FxpPreset::parse(&header(FX_REGULAR, 2)), Err(FxpError::Truncated { need: 64, .. })));

        let mut short_chunk = header(FX_OPAQUE, 0);
        short_chunk.write_i32::<BigEndian>(100).unwrap();
        assert!(matches!(FxpPreset::parse(&short_chunk), Err(FxpError::Truncated { need: 160, .. })));
    }
}
