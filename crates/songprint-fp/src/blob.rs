//! Blob encodings for persisted descriptors
//!
//! One descriptor per file. JSON is the default and matches the layout
//! external repair tooling expects; BSON and the packed binary format are
//! selectable per store.

use crate::descriptor::Descriptor;
use crate::error::FormatError;
use crate::reader::PackedReader;
use crate::writer::PackedWriter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk encoding of a descriptor blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlobFormat {
    #[default]
    Json,
    Bson,
    Packed,
}

impl BlobFormat {
    pub const ALL: [BlobFormat; 3] = [BlobFormat::Json, BlobFormat::Bson, BlobFormat::Packed];

    pub fn extension(&self) -> &'static str {
        match self {
            BlobFormat::Json => "json",
            BlobFormat::Bson => "bson",
            BlobFormat::Packed => "spd",
        }
    }

    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(BlobFormat::Json),
            Some("bson") => Some(BlobFormat::Bson),
            Some("spd") => Some(BlobFormat::Packed),
            _ => None,
        }
    }
}

/// Save a descriptor in the given format.
///
/// The file is written next to its destination and renamed into place, so
/// readers never observe a partially written blob.
pub fn save(descriptor: &Descriptor, path: &Path, format: BlobFormat) -> Result<(), FormatError> {
    match format {
        BlobFormat::Json => {
            let json_str = serde_json::to_string_pretty(descriptor)?;
            write_atomic(path, json_str.as_bytes())
        }
        BlobFormat::Bson => {
            let bytes = bson::to_vec(descriptor)?;
            write_atomic(path, &bytes)
        }
        BlobFormat::Packed => PackedWriter::new().write(path, descriptor),
    }
}

/// Load a descriptor, choosing the decoder from the file extension.
pub fn load_auto(path: &Path) -> Result<Descriptor, FormatError> {
    match BlobFormat::from_path(path) {
        Some(BlobFormat::Json) => load_json(path),
        Some(BlobFormat::Bson) => load_bson(path),
        Some(BlobFormat::Packed) => PackedReader::read(path),
        None => Err(FormatError::UnsupportedExtension(path.display().to_string())),
    }
}

fn load_json(path: &Path) -> Result<Descriptor, FormatError> {
    let json_str = std::fs::read_to_string(path).map_err(|e| FormatError::io(path, e))?;
    Ok(serde_json::from_str(&json_str)?)
}

fn load_bson(path: &Path) -> Result<Descriptor, FormatError> {
    let bytes = std::fs::read(path).map_err(|e| FormatError::io(path, e))?;
    Ok(bson::from_slice(&bytes)?)
}

/// Temporary sibling used while a file is being written.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write bytes to `<path>.tmp`, then rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), FormatError> {
    let tmp = temp_path(path);
    std::fs::write(&tmp, bytes).map_err(|e| FormatError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| FormatError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{descriptor_id, Fingerprint};

    fn sample() -> Descriptor {
        Descriptor {
            id: descriptor_id("tone.wav"),
            file_name: "tone.wav".to_string(),
            file_path: "library/tone.wav".to_string(),
            duration_seconds: 6.0,
            added_time: "2024-01-01 00:00:00".to_string(),
            song_name: "tone".to_string(),
            author: "Unknown Artist".to_string(),
            cover_path: None,
            mfcc_mean: vec![1.0, -2.5, 3.25],
            chroma_mean: vec![0.5; 36],
            tempo: Some(120.0),
            pulse_clarity: Some(0.4),
            energy_distribution: vec![0.1; 10],
            fingerprint: Fingerprint::from_rows(vec![vec![1, 0, 1], vec![0, 1, 0]]),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_format_loads_what_it_saved() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = sample();
        for format in BlobFormat::ALL {
            let path = dir.path().join(format!("{}.{}", descriptor.id, format.extension()));
            save(&descriptor, &path, format).unwrap();
            assert!(!temp_path(&path).exists());
            let loaded = load_auto(&path).unwrap();
            assert_eq!(loaded, descriptor, "format {:?}", format);
        }
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = load_auto(Path::new("features/abc.pkl")).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedExtension(_)));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(BlobFormat::from_path(Path::new("a/b.bson")), Some(BlobFormat::Bson));
        assert_eq!(BlobFormat::from_path(Path::new("a/b.spd")), Some(BlobFormat::Packed));
        assert_eq!(BlobFormat::from_path(Path::new("a/b.json.tmp")), None);
    }
}
