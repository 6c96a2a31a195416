//! Shared plumbing for the songprint command-line tools

pub mod output;

use anyhow::Result;
use songprint_core::SongprintStorageConfig;
use std::path::Path;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Initialize logging.
///
/// Off by default so stdout carries clean JSON; `--verbose` enables Info.
/// Module-specific directives in `RUST_LOG` still apply.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// Load the storage configuration.
///
/// An explicit path must exist. Without one, `config.toml` is used when
/// present, otherwise a filesystem store under `./music_features`.
pub fn load_config(path: Option<&Path>) -> Result<SongprintStorageConfig> {
    match path {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            SongprintStorageConfig::load(path)
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            log::info!("Loading configuration from {}", DEFAULT_CONFIG);
            SongprintStorageConfig::load(Path::new(DEFAULT_CONFIG))
        }
        None => {
            log::info!("No configuration file, using defaults");
            Ok(SongprintStorageConfig::default_filesystem("./music_features"))
        }
    }
}
