use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use vstpreset::cache::{find_cache_file, lookup_class, PluginClass};
use vstpreset::config::Settings;
use vstpreset::convert::{convert_fxp, retarget_directory, PresetDefaults};
use vstpreset::{ChunkEntry, ClassId, FourCc, Preset};

/// Exit status when the target class id or vendor cannot be determined.
const EXIT_UNRESOLVED: i32 = 2;

#[derive(Parser)]
#[command(name = "vstpreset", version, about = "Read, inspect and convert .vstpreset files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header and chunk layout of one or more presets
    Info {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
        /// Emit one JSON object per file
        #[arg(long)]
        json: bool,
    },
    /// Retarget the presets of a VST2 plugin to the corresponding VST3 plugin
    Retarget {
        /// Name of the target VST3 plugin
        #[arg(short = '3', long = "vst3name")]
        name: String,
        /// Directory with the source presets (default: current directory)
        #[arg(short, long)]
        directory: Option<PathBuf>,
        /// Host preferences directory or path to vst3plugins.xml
        #[arg(long)]
        vst3cache: Option<PathBuf>,
        /// Class id of the target plugin, if it cannot be detected
        #[arg(short, long)]
        id: Option<String>,
        /// Vendor of the target plugin, if it cannot be detected
        #[arg(long)]
        vendor: Option<String>,
        /// Root of the preset tree (default: Documents/VST3 Presets)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// JSON settings file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Convert a VST2 .fxp program into a .vstpreset
    Fxp {
        input: PathBuf,
        /// Output directory (default: system temp dir)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Existing .vstpreset to take class id, version and tags from
        #[arg(long)]
        vst3_preset: Option<PathBuf>,
        #[arg(long)]
        class_id: Option<String>,
        #[arg(long)]
        version: Option<i32>,
        #[arg(long)]
        header: Option<String>,
        #[arg(long)]
        chunklist_id: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { files, json } => {
            for path in &files {
                let data = std::fs::read(path)?;
                let (preset, entries) = match Preset::decode_with_index(&data) {
                    Ok(p) => p,
                    Err(e) => {
                        error!("{}: not a valid preset file: {e}", path.display());
                        continue;
                    }
                };
                let roundtrip = preset.encode().map(|out| out == data).unwrap_or(false);
                if json {
                    println!("{}", info_json(path, &preset, &entries, roundtrip)?);
                } else {
                    print_info(path, &data, &preset, &entries, roundtrip);
                }
            }
        }

        // ── Retarget ─────────────────────────────────────────────────────────
        Commands::Retarget { name, directory, vst3cache, id, vendor, output_dir, config } => {
            let mut settings = Settings::load_or_default(config.as_deref())?;
            if let Some(dir) = vst3cache  { settings.cache_dir = dir; }
            if let Some(dir) = output_dir { settings.output_dir = dir; }

            let input_dir = match directory {
                Some(dir) => dir,
                None      => std::env::current_dir()?,
            };

            let found = resolve_class(&name, &settings.cache_dir);
            let class_id = non_empty(found.as_ref().map(|c| c.cid.clone())).or(id);
            let vendor = non_empty(found.map(|c| c.vendor)).or(vendor);
            let Some(class_id) = class_id else {
                error!("Cannot determine class ID for '{name}', please check the name given with --vst3name");
                std::process::exit(EXIT_UNRESOLVED);
            };
            let Some(vendor) = vendor else {
                error!("Cannot determine vendor name for '{name}', please check the name given with --vst3name");
                std::process::exit(EXIT_UNRESOLVED);
            };

            let out_dir = settings.plugin_output_dir(&vendor, &name);
            let written = retarget_directory(&input_dir, &out_dir, &ClassId::from(class_id))?;
            println!("Converted {} preset(s) into {}", written.len(), out_dir.display());
        }

        // ── Fxp ──────────────────────────────────────────────────────────────
        Commands::Fxp { input, out, vst3_preset, class_id, version, header, chunklist_id } => {
            let mut defaults = PresetDefaults::default();
            let mut target: Option<ClassId> = None;
            if let Some(sample_path) = vst3_preset {
                let sample = Preset::read_file(&sample_path)?;
                println!("Using defaults from {}: {sample}", sample_path.display());
                defaults = PresetDefaults::from_sample(&sample);
                target = Some(sample.class_id);
            }
            if let Some(id) = class_id    { target = Some(ClassId::from(id)); }
            if let Some(v) = version      { defaults.version = v; }
            if let Some(h) = header       { defaults.header_id = h.parse::<FourCc>()?; }
            if let Some(c) = chunklist_id { defaults.chunklist_id = c.parse::<FourCc>()?; }

            let Some(target) = target.filter(|id| !id.is_empty()) else {
                error!("A class id is required: pass --class-id or --vst3-preset");
                std::process::exit(EXIT_UNRESOLVED);
            };
            let out_dir = out.unwrap_or_else(std::env::temp_dir);
            let written = convert_fxp(&input, &out_dir, &target, &defaults)?;
            println!("Wrote .vstpreset to: {}", written.display());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn resolve_class(name: &str, cache_dir: &Path) -> Option<PluginClass> {
    let found = find_cache_file(cache_dir).and_then(|file| lookup_class(name, &file));
    match found {
        Ok(class) => class,
        Err(e) => {
            warn!("Plugin cache lookup failed: {e}");
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Prints the index as stored in the file, not the one `encode` would write.
fn print_info(path: &Path, buf: &[u8], preset: &Preset, entries: &[ChunkEntry], roundtrip: bool) {
    println!("── {} ─────────────────────────────────────────", path.display());
    println!("  Header id      {}", preset.header_id);
    println!("  Version        {}", preset.version);
    match preset.class_id.as_uuid() {
        Some(uuid) => println!("  Class id       {} ({})", preset.class_id, uuid.hyphenated()),
        None       => println!("  Class id       {}", preset.class_id),
    }
    println!("  Chunk list     '{}' at {} B", preset.chunklist_id, preset.chunklist_offset);
    println!("  {:<6} {:>10} {:>10}  First bytes", "Chunk", "Offset", "Size");
    for entry in entries {
        let data = entry.range().ok().and_then(|r| buf.get(r)).unwrap_or_default();
        println!("  {:<6} {:>10} {:>10}  {}",
            entry.id.to_string(), entry.offset, entry.size, hex::encode(&data[..data.len().min(8)]));
    }
    if !roundtrip {
        println!("  data differs");
    }
}

fn info_json(
    path:      &Path,
    preset:    &Preset,
    entries:   &[ChunkEntry],
    roundtrip: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let chunks: Vec<_> = entries
        .iter()
        .map(|e| json!({ "id": e.id.to_string(), "offset": e.offset, "size": e.size }))
        .collect();
    let summary = json!({
        "path":             path.display().to_string(),
        "header_id":        preset.header_id.to_string(),
        "version":          preset.version,
        "class_id":         preset.class_id.as_str(),
        "chunklist_id":     preset.chunklist_id.to_string(),
        "chunklist_offset": preset.chunklist_offset,
        "chunks":           chunks,
        "roundtrip":        roundtrip,
    });
    Ok(serde_json::to_string(&summary)?)
}
