//! spgen - Extract descriptors and add them to the library
//!
//! Usage:
//!   spgen <path>...                          # files or directories
//!   spgen --metadata meta.json <dir>         # apply name/artist template
//!   spgen --config config.toml <dir>

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Deserialize;
use songprint_cli::output::{print_json, FailedFile, IngestSummary};
use songprint_cli::{init_logging, load_config};
use songprint_core::descriptor::file_stem;
use songprint_core::{audio, open_store, Extractor, FeatureStore};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "spgen")]
#[command(about = "Extract audio descriptors into the songprint library", long_about = None)]
struct Args {
    /// Audio files or directories to scan recursively
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Path to configuration file (TOML). Defaults to config.toml if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON object mapping file stem to {"name", "artist"}
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Metadata template entry
#[derive(Debug, Default, Deserialize)]
struct TrackInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artist: Option<String>,
}

enum Outcome {
    Added,
    Replaced,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let template = match &args.metadata {
        Some(path) => load_template(path)?,
        None => HashMap::new(),
    };

    let (files, skipped_duplicates) = collect_audio_files(&args.inputs);
    log::info!(
        "Found {} audio file(s), {} duplicate name(s) skipped",
        files.len(),
        skipped_duplicates
    );

    let store = open_store(&config).context("Failed to open feature store")?;
    let extractor = Extractor::new(config.extraction.clone())?;

    let start = std::time::Instant::now();
    let outcomes: Vec<(PathBuf, Result<Outcome>)> = files
        .par_iter()
        .map(|path| {
            let outcome = ingest(path, &extractor, store.as_ref(), &template);
            if let Err(e) = &outcome {
                log::warn!("Failed to ingest {}: {:#}", path.display(), e);
            }
            (path.clone(), outcome)
        })
        .collect();

    let mut summary = IngestSummary {
        processed: outcomes.len(),
        skipped_duplicates,
        ..Default::default()
    };
    for (path, outcome) in outcomes {
        match outcome {
            Ok(Outcome::Added) => summary.added += 1,
            Ok(Outcome::Replaced) => summary.replaced += 1,
            Err(e) => summary.failed.push(FailedFile {
                path: path.display().to_string(),
                error: format!("{:#}", e),
            }),
        }
    }

    log::info!(
        "Ingested {} file(s) in {:.2}s: {} added, {} replaced, {} failed",
        summary.processed,
        start.elapsed().as_secs_f64(),
        summary.added,
        summary.replaced,
        summary.failed.len()
    );
    print_json(&summary);
    Ok(())
}

fn load_template(path: &Path) -> Result<HashMap<String, TrackInfo>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata template: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse metadata template: {}", path.display()))
}

/// Supported files under `inputs`, one per file name.
///
/// The id is derived from the file name, so later files sharing a name
/// with an earlier one are skipped to keep a single writer per id.
fn collect_audio_files(inputs: &[PathBuf]) -> (Vec<PathBuf>, usize) {
    let mut seen = BTreeSet::new();
    let mut files = Vec::new();
    let mut duplicates = 0;

    for input in inputs {
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !audio::is_supported(path) {
                continue;
            }
            let Some(name) = path.file_name().map(|n| n.to_os_string()) else {
                continue;
            };
            if seen.insert(name) {
                files.push(path.to_path_buf());
            } else {
                log::warn!("Duplicate file name {}, skipping", path.display());
                duplicates += 1;
            }
        }
    }
    (files, duplicates)
}

fn ingest(
    path: &Path,
    extractor: &Extractor,
    store: &dyn FeatureStore,
    template: &HashMap<String, TrackInfo>,
) -> Result<Outcome> {
    let mut descriptor = extractor.extract(path)?;
    if let Some(info) = template.get(&file_stem(&descriptor.file_name)) {
        if let Some(name) = &info.name {
            descriptor.song_name = name.clone();
        }
        if let Some(artist) = &info.artist {
            descriptor.author = artist.clone();
        }
    }

    let is_new = store.add(descriptor)?;
    Ok(if is_new {
        Outcome::Added
    } else {
        Outcome::Replaced
    })
}
