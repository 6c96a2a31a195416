//! Error types for extraction and storage

use songprint_fp::FormatError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn an audio file into a descriptor.
///
/// The store is never touched when extraction fails.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("extraction cancelled")]
    Cancelled,
}

/// Failure of a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Codec(#[from] FormatError),

    #[error("index error: {0}")]
    Index(#[from] serde_json::Error),

    #[error("descriptor has no file name")]
    MissingFileName,

    #[error("unknown descriptor id: {0}")]
    UnknownId(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
