use byteorder::{BigEndian, WriteBytesExt};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use vstpreset::cache::{find_cache_file, lookup_class, CacheError};
use vstpreset::config::{ConfigError, Settings};
use vstpreset::convert::{convert_fxp, list_presets, retarget_directory, PresetDefaults};
use vstpreset::params::{decode_parameters, Parameter};
use vstpreset::tag::{COMP, CONT, INFO};
use vstpreset::{ClassId, Preset, PresetError};

const TARGET_CID: &str = "ABCDEF0123456789ABCDEF0123456789";

fn sample_preset(class_id: &str) -> Preset {
    let mut preset = Preset::new(class_id);
    preset.insert_chunk(COMP, b"component state".to_vec());
    preset.insert_chunk(CONT, b"controller".to_vec());
    preset.insert_chunk(INFO, b"<MetaInfo/>".to_vec());
    preset
}

fn fxp_regular(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_all(b"CcnK").unwrap();
    out.write_i32::<BigEndian>(0).unwrap();
    out.write_all(b"FxCk").unwrap();
    out.write_i32::<BigEndian>(1).unwrap();
    out.write_all(b"Plug").unwrap();
    out.write_i32::<BigEndian>(1).unwrap();
    out.write_i32::<BigEndian>(values.len() as i32).unwrap();
    out.write_all(&[0u8; 28]).unwrap();
    for v in values {
        out.write_f32::<BigEndian>(*v).unwrap();
    }
    out
}

#[test]
fn test_write_and_read_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("init.vstpreset");

    let preset = sample_preset(TARGET_CID);
    preset.write_file(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes, preset.encode().unwrap());

    let loaded = Preset::read_file(&path).unwrap();
    assert_eq!(loaded, preset);
    assert!(loaded.chunks.keys().eq(preset.chunks.keys()));
    assert_eq!(loaded.encode().unwrap(), bytes);
}

#[test]
fn test_read_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Preset::read_file(dir.path().join("absent.vstpreset")).unwrap_err();
    assert!(matches!(err, PresetError::Io(_)));
}

#[test]
fn test_retarget_directory() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out_dir = output.path().join("Acme").join("Synth");

    sample_preset("OLD-VST2-ID").write_file(input.path().join("a.vstpreset")).unwrap();
    sample_preset("OLD-VST2-ID").write_file(input.path().join("b.vstpreset")).unwrap();
    fs::write(input.path().join("broken.vstpreset"), b"not a preset").unwrap();
    fs::write(input.path().join("notes.txt"), b"ignored").unwrap();

    assert_eq!(list_presets(input.path()).len(), 3);

    let written = retarget_directory(input.path(), &out_dir, &ClassId::from(TARGET_CID)).unwrap();
    assert_eq!(written, vec![out_dir.join("v2 a.vstpreset"), out_dir.join("v2 b.vstpreset")]);

    for path in &written {
        let converted = Preset::read_file(path).unwrap();
        assert_eq!(converted.class_id.as_str(), TARGET_CID);
        assert_eq!(converted.chunks, sample_preset("x").chunks);
    }
    assert!(!out_dir.join("v2 broken.vstpreset").exists());
}

#[test]
fn test_convert_regular_fxp() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Lead.fxp");
    fs::write(&input, fxp_regular(&[0.0, 0.25, 1.0])).unwrap();

    let out = convert_fxp(&input, dir.path(), &ClassId::from(TARGET_CID), &PresetDefaults::default())
        .unwrap();
    assert_eq!(out, dir.path().join("Lead.vstpreset"));

    let preset = Preset::read_file(&out).unwrap();
    assert_eq!(preset.class_id.as_str(), TARGET_CID);
    assert_eq!(preset.chunks.len(), 1);
    assert_eq!(
        decode_parameters(preset.comp()).unwrap(),
        vec![Parameter::new(0, 0.0), Parameter::new(1, 0.25), Parameter::new(2, 1.0)]
    );
}

#[test]
fn test_convert_rejects_bank_files() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bank.fxb");
    let mut bank = fxp_regular(&[]);
    bank[8..12].copy_from_slice(b"FxBk");
    fs::write(&input, bank).unwrap();

    let result = convert_fxp(&input, dir.path(), &ClassId::from(TARGET_CID), &PresetDefaults::default());
    assert!(result.is_err());
    assert!(!dir.path().join("bank.vstpreset").exists());
}

fn write_cache(dir: &Path, xml: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("vst3plugins.xml"), xml).unwrap();
}

const CACHE_XML: &str = r#"<Plugins><plugin><class>
  <cid>ABCDEF0123456789ABCDEF0123456789</cid>
  <category>Audio Module Class</category>
  <name>Synth</name>
  <vendor>Acme</vendor>
</class></plugin></Plugins>"#;

#[test]
fn test_cache_file_prefers_newest_host() {
    let base = TempDir::new().unwrap();
    write_cache(&base.path().join("Cubase 11").join("Cubase Pro VST3 Cache"), "<Plugins/>");
    write_cache(&base.path().join("Cubase 12").join("Cubase Pro VST3 Cache"), CACHE_XML);
    fs::create_dir_all(base.path().join("Nuendo 12")).unwrap();

    let file = find_cache_file(base.path()).unwrap();
    assert!(file.starts_with(base.path().join("Cubase 12")));

    let class = lookup_class("Synth", &file).unwrap().unwrap();
    assert_eq!(class.cid, TARGET_CID);
    assert_eq!(class.vendor, "Acme");

    // The cache file can be named directly.
    assert_eq!(find_cache_file(&file).unwrap(), file);
}

#[test]
fn test_cache_file_missing() {
    let base = TempDir::new().unwrap();
    assert!(matches!(find_cache_file(base.path()), Err(CacheError::NoPreferencesDir(_))));

    fs::create_dir_all(base.path().join("Cubase 10")).unwrap();
    assert!(matches!(find_cache_file(base.path()), Err(CacheError::NotFound(_))));
}

#[test]
fn test_settings_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{ "cache_dir": "/prefs", "output_dir": "/presets" }"#).unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.cache_dir, Path::new("/prefs"));
    assert_eq!(settings.plugin_output_dir("Acme", "Synth"), Path::new("/presets/Acme/Synth"));

    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(Settings::load(&path), Err(ConfigError::Parse { .. })));
    assert!(matches!(
        Settings::load(&dir.path().join("missing.json")),
        Err(ConfigError::Io { .. })
    ));
    assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
}
