//! Tool settings: built-in defaults, an optional JSON settings file, then
//! command-line overrides (applied by the binary).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Host vendor directory under the user's config dir.
const PREFS_VENDOR_DIR: &str = "Steinberg";
/// Preset root under the user's documents dir.
const PRESET_ROOT_DIR:  &str = "VST3 Presets";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read settings {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("Invalid settings {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Host preferences directory, or the `vst3plugins.xml` file itself.
    pub cache_dir:  PathBuf,
    /// Root under which `<vendor>/<plugin>` preset folders are created.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let cache_dir = dirs::config_dir()
            .map(|d| d.join(PREFS_VENDOR_DIR))
            .unwrap_or_else(|| PathBuf::from(PREFS_VENDOR_DIR));
        let output_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .map(|d| d.join(PRESET_ROOT_DIR))
            .unwrap_or_else(|| PathBuf::from(PRESET_ROOT_DIR));
        Self { cache_dir, output_dir }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Settings from `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Destination folder for one plugin's presets.
    pub fn plugin_output_dir(&self, vendor: &str, plugin: &str) -> PathBuf {
        self.output_dir.join(vendor).join(plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "output_dir": "/tmp/presets" }"#).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/presets"));
        assert_eq!(settings.cache_dir, Settings::default().cache_dir);
        assert_eq!(
            settings.plugin_output_dir("Acme", "Synth"),
            PathBuf::from("/tmp/presets/Acme/Synth")
        );
    }
}
