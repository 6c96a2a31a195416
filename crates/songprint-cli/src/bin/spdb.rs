//! spdb - Inspect and maintain the songprint library
//!
//! Usage:
//!   spdb list
//!   spdb show <id>
//!   spdb remove <id>
//!   spdb update <id> [--name <name>] [--artist <artist>]
//!   spdb set-cover <id> <image>
//!   spdb repair

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use songprint_cli::output::{print_json, ListedEntry};
use songprint_cli::{init_logging, load_config};
use songprint_core::storage_config::StorageBackendKind;
use songprint_core::{open_store, FilesystemStore, MetadataPatch};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spdb")]
#[command(about = "Manage the songprint library", long_about = None)]
struct Args {
    /// Path to configuration file (TOML). Defaults to config.toml if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all entries
    List,
    /// Print the full descriptor for an id
    Show { id: String },
    /// Delete an entry, its blob and its cover
    Remove { id: String },
    /// Change song name and/or artist
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        artist: Option<String>,
    },
    /// Copy an image into the library as cover art
    SetCover { id: String, image: PathBuf },
    /// Rebuild the index from the stored blobs
    Repair,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let open = || open_store(&config).context("Failed to open feature store");

    match args.command {
        Command::List => {
            let entries = open()?.list();
            let listed: Vec<ListedEntry> = entries
                .iter()
                .map(|entry| ListedEntry {
                    id: &entry.id,
                    entry,
                })
                .collect();
            print_json(&listed);
        }
        Command::Show { id } => {
            let descriptor = open()?
                .get(&id)
                .with_context(|| format!("No descriptor with id {}", id))?;
            print_json(&descriptor);
        }
        Command::Remove { id } => {
            if !open()?.remove(&id)? {
                anyhow::bail!("No descriptor with id {}", id);
            }
            log::info!("Removed {}", id);
        }
        Command::Update { id, name, artist } => {
            let patch = MetadataPatch {
                song_name: name,
                author: artist,
                cover_path: None,
            };
            if patch.is_empty() {
                anyhow::bail!("Nothing to update: pass --name and/or --artist");
            }
            if !open()?.update_metadata(&id, &patch)? {
                anyhow::bail!("No descriptor with id {}", id);
            }
            log::info!("Updated {}", id);
        }
        Command::SetCover { id, image } => {
            if !image.is_file() {
                anyhow::bail!("Cover image not found: {}", image.display());
            }
            if !open()?.set_cover(&id, &image)? {
                anyhow::bail!("No descriptor with id {}", id);
            }
            log::info!("Set cover for {}", id);
        }
        Command::Repair => {
            if config.storage.backend != StorageBackendKind::Filesystem {
                anyhow::bail!("repair requires the filesystem backend");
            }
            let store = FilesystemStore::open(&config.storage.filesystem)
                .context("Failed to open feature store")?;
            print_json(&store.repair()?);
        }
    }
    Ok(())
}
