//! Class-id lookup in a host's VST3 plugin cache (`vst3plugins.xml`).
//!
//! The cache lists `plugin` elements, each with one or more `class`
//! children carrying `name`, `category`, `cid` and `vendor`.  Only classes of
//! category `Audio Module Class` are considered.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const CACHE_FILE_NAME:     &str = "vst3plugins.xml";
pub const AUDIO_MODULE_CLASS:  &str = "Audio Module Class";
const HOST_DIR_MARKER:         &str = "Cubase";
const CACHE_DIR_MARKER:        &str = "VST3 Cache";
/// Host generations tried in order.
const HOST_GENERATIONS:        [&str; 3] = ["12", "11", "10"];

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("No preferences directory for {HOST_DIR_MARKER} found in {0}")]
    NoPreferencesDir(PathBuf),
    #[error("Plugin cache not found: {0}")]
    NotFound(PathBuf),
    #[error("Invalid plugin cache: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginClass {
    pub cid:    String,
    pub vendor: String,
}

/// Resolve the cache file under a host preferences base directory.
///
/// `base` may also name the cache file itself.
pub fn find_cache_file(base: &Path) -> Result<PathBuf, CacheError> {
    if base.file_name().is_some_and(|name| name == CACHE_FILE_NAME) {
        return if base.is_file() {
            Ok(base.to_path_buf())
        } else {
            Err(CacheError::NotFound(base.to_path_buf()))
        };
    }

    let host_dirs = child_dirs(base, HOST_DIR_MARKER);
    let app_dir = HOST_GENERATIONS
        .iter()
        .find_map(|generation| host_dirs.iter().find(|d| dir_name_contains(d, generation)))
        .or_else(|| host_dirs.first())
        .ok_or_else(|| CacheError::NoPreferencesDir(base.to_path_buf()))?;

    child_dirs(app_dir, CACHE_DIR_MARKER)
        .into_iter()
        .map(|dir| dir.join(CACHE_FILE_NAME))
        .find(|file| file.is_file())
        .ok_or_else(|| CacheError::NotFound(app_dir.join(CACHE_DIR_MARKER).join(CACHE_FILE_NAME)))
}

/// Look up the audio-module class named `name`.  `Ok(None)` when absent.
pub fn lookup_class(name: &str, cache_file: &Path) -> Result<Option<PluginClass>, CacheError> {
    let text = std::fs::read_to_string(cache_file)?;
    find_class(name, &text)
}

pub fn find_class(name: &str, xml: &str) -> Result<Option<PluginClass>, CacheError> {
    let doc = roxmltree::Document::parse(xml)?;
    let classes = doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("plugin"))
        .flat_map(|plugin| plugin.children().filter(|n| n.has_tag_name("class")).map(move |c| (plugin, c)));

    for (plugin, class) in classes {
        if child_text(class, "name") != Some(name)
            || child_text(class, "category") != Some(AUDIO_MODULE_CLASS)
        {
            continue;
        }
        let vendor = child_text(class, "vendor").or_else(|| child_text(plugin, "vendor"));
        return Ok(Some(PluginClass {
            cid:    child_text(class, "cid").unwrap_or_default().to_owned(),
            vendor: vendor.unwrap_or_default().to_owned(),
        }));
    }
    Ok(None)
}

fn child_text<'a>(node: roxmltree::Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
        .map(str::trim)
}

fn child_dirs(dir: &Path, marker: &str) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .filter(|p| dir_name_contains(p, marker))
        .collect();
    dirs.sort();
    dirs
}

fn dir_name_contains(path: &Path, needle: &str) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().contains(needle))
        .unwrap_or(false)
}
