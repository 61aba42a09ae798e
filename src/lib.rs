pub mod tag;
pub mod header;
pub mod chunklist;
pub mod preset;
pub mod params;
pub mod legacy;
pub mod fxp;
pub mod cache;
pub mod config;
pub mod convert;

pub use tag::FourCc;
pub use header::{ClassId, PresetHeader, HEADER_SIZE};
pub use chunklist::{ChunkEntry, ChunkListHeader};
pub use preset::{Preset, PresetError};
pub use params::Parameter;
pub use legacy::LegacyPreset;
pub use fxp::FxpPreset;
