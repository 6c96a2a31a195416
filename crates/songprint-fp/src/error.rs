use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while encoding or decoding descriptor blobs.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON encode error: {0}")]
    BsonEncode(#[from] bson::ser::Error),

    #[error("BSON decode error: {0}")]
    BsonDecode(#[from] bson::de::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Packed file failed header or checksum validation.
    #[error("invalid packed file {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("unsupported blob extension: {0}")]
    UnsupportedExtension(String),
}

impl FormatError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FormatError::Io {
            path: path.into(),
            source,
        }
    }

    /// The underlying I/O error, if this is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            FormatError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
