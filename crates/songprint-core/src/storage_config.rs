//! Storage configuration for songprint
//!
//! Provides TOML-based configuration for selecting the feature store
//! backend (filesystem vs in-memory) and the blob encoding.

use crate::config::{MatchConfig, SongprintConfig};
use serde::{Deserialize, Serialize};
use songprint_fp::BlobFormat;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SongprintStorageConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub extraction: SongprintConfig,
    #[serde(default)]
    pub matching: MatchConfig,
}

/// Storage backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
}

/// Storage backend type
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Filesystem,
    Memory,
}

/// Filesystem backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesystemConfig {
    #[serde(default = "default_database_root")]
    pub database_root: PathBuf,
    #[serde(default)]
    pub format: BlobFormat,
    /// Absolute file paths under this directory are stored root-relative
    #[serde(default)]
    pub media_root: Option<PathBuf>,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            database_root: default_database_root(),
            format: BlobFormat::default(),
            media_root: None,
        }
    }
}

fn default_database_root() -> PathBuf {
    PathBuf::from("./music_features")
}

impl SongprintStorageConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: SongprintStorageConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        config.extraction.validate()?;
        config.matching.validate()?;
        Ok(config)
    }

    /// Create a default filesystem configuration rooted at `database_root`
    pub fn default_filesystem(database_root: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackendKind::Filesystem,
                filesystem: FilesystemConfig {
                    database_root: database_root.into(),
                    ..Default::default()
                },
            },
            extraction: SongprintConfig::default(),
            matching: MatchConfig::default(),
        }
    }

    /// Create an in-memory configuration
    pub fn default_memory() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackendKind::Memory,
                filesystem: FilesystemConfig::default(),
            },
            extraction: SongprintConfig::default(),
            matching: MatchConfig::default(),
        }
    }
}
