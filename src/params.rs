//! Normalized-parameter storage for the reserved `Comp` chunk.
//!
//! Record layout, repeated with no count prefix:
//!
//! | Field | Size | Notes |
//! |-------|------|-------|
//! | id    | 4 B  | u32 LE |
//! | value | 8 B  | f64 LE, clamped to [0, 1] |

use byteorder::{LittleEndian, ReadBytesExt};

use crate::preset::PresetError;

pub const PARAM_RECORD_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    pub id:    u32,
    pub value: f64,
}

impl Parameter {
    pub fn new(id: u32, value: f64) -> Self {
        Self { id, value }
    }

    fn normalized(&self) -> f64 {
        if self.value.is_finite() { self.value.clamp(0.0, 1.0) } else { 0.0 }
    }
}

pub fn encode_parameters(params: &[Parameter]) -> Vec<u8> {
    let mut out = Vec::with_capacity(params.len() * PARAM_RECORD_SIZE);
    for p in params {
        out.extend_from_slice(&p.id.to_le_bytes());
        out.extend_from_slice(&p.normalized().to_le_bytes());
    }
    out
}

pub fn decode_parameters(mut data: &[u8]) -> Result<Vec<Parameter>, PresetError> {
    if data.len() % PARAM_RECORD_SIZE != 0 {
        return Err(PresetError::MalformedParameters(data.len()));
    }
    let mut params = Vec::with_capacity(data.len() / PARAM_RECORD_SIZE);
    while !data.is_empty() {
        params.push(Parameter {
            id:    data.read_u32::<LittleEndian>()?,
            value: data.read_f64::<LittleEndian>()?,
        });
    }
    Ok(params)
}
