//! Conversion pipelines layered over the codec: building a container from a
//! legacy preset and retargeting existing containers to another plugin class.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::fxp::{FxpError, FxpPreset};
use crate::header::ClassId;
use crate::legacy::LegacyPreset;
use crate::params::encode_parameters;
use crate::preset::{Preset, PresetError, DEFAULT_VERSION};
use crate::tag::{FourCc, CHUNKLIST_ID, COMP, HEADER_ID};

pub const PRESET_EXTENSION: &str = "vstpreset";
/// Prefix of retargeted file names.
pub const RETARGET_PREFIX:  &str = "v2 ";

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("{path}: {source}")]
    Preset { path: PathBuf, source: PresetError },
    #[error("{path}: {source}")]
    Fxp { path: PathBuf, source: FxpError },
    #[error("Cannot create {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

/// Container fields that are not derived from the legacy preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetDefaults {
    pub header_id:    FourCc,
    pub version:      i32,
    pub chunklist_id: FourCc,
}

impl Default for PresetDefaults {
    fn default() -> Self {
        Self { header_id: HEADER_ID, version: DEFAULT_VERSION, chunklist_id: CHUNKLIST_ID }
    }
}

impl PresetDefaults {
    /// Take tags and version from an existing container.
    pub fn from_sample(sample: &Preset) -> Self {
        Self {
            header_id:    sample.header_id,
            version:      sample.version,
            chunklist_id: sample.chunklist_id,
        }
    }
}

/// Build a container whose `Comp` chunk holds the legacy state: the opaque
/// blob if there is one, otherwise the encoded parameter list.
pub fn from_legacy(
    legacy:   &dyn LegacyPreset,
    class_id: impl Into<ClassId>,
    defaults: &PresetDefaults,
) -> Preset {
    let mut preset = Preset::new(class_id);
    preset.header_id = defaults.header_id;
    preset.version = defaults.version;
    preset.chunklist_id = defaults.chunklist_id;

    match legacy.data() {
        Some(blob) if legacy.is_opaque() => {
            preset.insert_chunk(COMP, blob);
        }
        _ => {
            preset.insert_chunk(COMP, encode_parameters(legacy.parameters()));
        }
    }
    preset
}

/// Same container, different target plugin.
pub fn retarget(mut preset: Preset, class_id: impl Into<ClassId>) -> Preset {
    preset.class_id = class_id.into();
    preset
}

/// `.vstpreset` files directly inside `dir`, sorted by path.
pub fn list_presets(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == PRESET_EXTENSION))
        .collect();
    files.sort();
    files
}

/// Retarget every preset in `input_dir` and write it to `output_dir` as
/// `"v2 <name>"`.  Files that fail to decode are skipped.
pub fn retarget_directory(
    input_dir:  &Path,
    output_dir: &Path,
    class_id:   &ClassId,
) -> Result<Vec<PathBuf>, ConvertError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ConvertError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for file in list_presets(input_dir) {
        let preset = match Preset::read_file(&file) {
            Ok(p) => p,
            Err(e) => {
                warn!("Skipping {}: not a valid preset ({e})", file.display());
                continue;
            }
        };
        debug!("Read {}: {preset}", file.display());

        let Some(name) = file.file_name() else { continue };
        let out = output_dir.join(format!("{RETARGET_PREFIX}{}", name.to_string_lossy()));
        retarget(preset, class_id.clone())
            .write_file(&out)
            .map_err(|source| ConvertError::Preset { path: out.clone(), source })?;
        info!("Converted preset {}", out.display());
        written.push(out);
    }
    Ok(written)
}

/// Convert one `.fxp` program into `<output_dir>/<stem>.vstpreset`.
pub fn convert_fxp(
    input:      &Path,
    output_dir: &Path,
    class_id:   &ClassId,
    defaults:   &PresetDefaults,
) -> Result<PathBuf, ConvertError> {
    let fxp = FxpPreset::read_file(input).map_err(|source| ConvertError::Fxp {
        path: input.to_path_buf(),
        source,
    })?;
    info!(
        "Loaded {}: program '{}', plugin id {}, {} ({} params)",
        input.display(),
        fxp.name,
        fxp.plugin_id,
        if fxp.is_opaque() { "opaque" } else { "regular" },
        fxp.param_count,
    );

    std::fs::create_dir_all(output_dir).map_err(|source| ConvertError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let out = output_dir.join(format!("{stem}.{PRESET_EXTENSION}"));

    from_legacy(&fxp, class_id.clone(), defaults)
        .write_file(&out)
        .map_err(|source| ConvertError::Preset { path: out.clone(), source })?;
    info!("Wrote {}", out.display());
    Ok(out)
}
