//! spmatch - Identify an audio file against the library
//!
//! Usage:
//!   spmatch <query_audio>
//!   spmatch --config config.toml <query_audio>

use anyhow::{Context, Result};
use clap::Parser;
use songprint_cli::output::{print_json, MatchReport};
use songprint_cli::{init_logging, load_config};
use songprint_core::{match_file, open_store};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spmatch")]
#[command(about = "Match an audio file against the songprint library", long_about = None)]
struct Args {
    /// Query audio file
    query: PathBuf,

    /// Path to configuration file (TOML). Defaults to config.toml if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the acceptance threshold
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if !args.query.exists() {
        anyhow::bail!("Query file not found: {}", args.query.display());
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(threshold) = args.threshold {
        config.matching.accept_threshold = threshold;
        config.matching.validate()?;
    }

    let store = open_store(&config).context("Failed to open feature store")?;
    log::info!("Library has {} entries", store.len());

    let start = std::time::Instant::now();
    let (_, result) = match_file(&args.query, store.as_ref(), &config)?;
    log::info!(
        "Matching completed in {:.2}s (confidence {:.4})",
        start.elapsed().as_secs_f64(),
        result.confidence
    );

    print_json(&MatchReport::new(&args.query, result));
    Ok(())
}
