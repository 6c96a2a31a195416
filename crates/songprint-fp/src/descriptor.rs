//! Descriptor record and its index projection

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Stable identifier for a file name: lowercase MD5 hex digest.
pub fn descriptor_id(file_name: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(file_name.as_bytes());
    hex::encode(hasher.finalize())
}

/// 2-D binary fingerprint, row-major, one byte (0 or 1) per bit.
///
/// Rows are frequency bands and columns are time steps. Ragged input is
/// truncated to the shortest row so every row has `cols()` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Fingerprint {
    bits: Vec<Vec<u8>>,
}

impl Fingerprint {
    /// All-zero fingerprint of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        if cols == 0 {
            return Self::default();
        }
        Self {
            bits: vec![vec![0; cols]; rows],
        }
    }

    pub fn from_rows(rows: Vec<Vec<u8>>) -> Self {
        let cols = rows.iter().map(Vec::len).min().unwrap_or(0);
        if cols == 0 {
            return Self::default();
        }
        let bits = rows
            .into_iter()
            .map(|mut row| {
                row.truncate(cols);
                row.iter_mut().for_each(|b| *b = u8::from(*b != 0));
                row
            })
            .collect();
        Self { bits }
    }

    pub fn rows(&self) -> usize {
        self.bits.len()
    }

    pub fn cols(&self) -> usize {
        self.bits.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.bits[row][col] != 0
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.bits[row][col] = u8::from(value);
    }

    pub fn as_rows(&self) -> &[Vec<u8>] {
        &self.bits
    }

    pub fn count_ones(&self) -> usize {
        self.bits
            .iter()
            .map(|row| row.iter().filter(|&&b| b != 0).count())
            .sum()
    }
}

impl From<Vec<Vec<u8>>> for Fingerprint {
    fn from(rows: Vec<Vec<u8>>) -> Self {
        Fingerprint::from_rows(rows)
    }
}

impl From<Fingerprint> for Vec<Vec<u8>> {
    fn from(fp: Fingerprint) -> Self {
        fp.bits
    }
}

/// Persisted per-asset record: metadata, aggregated features and fingerprint.
///
/// Vector features default to empty and scalar rhythm features to `None`
/// so that records written by older extractors still load; the matcher
/// treats empty / missing features as not computable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub id: String,
    pub file_name: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(rename = "duration", default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub added_time: String,
    #[serde(default)]
    pub song_name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub cover_path: Option<String>,

    // Mel spectrum statistics (dB)
    #[serde(default)]
    pub mel_mean: Vec<f32>,
    #[serde(default)]
    pub mel_std: Vec<f32>,
    #[serde(default)]
    pub mel_skew: Vec<f32>,

    // MFCC stacked with deltas
    #[serde(default)]
    pub mfcc_mean: Vec<f32>,
    #[serde(default)]
    pub mfcc_std: Vec<f32>,
    #[serde(default)]
    pub mfcc_skew: Vec<f32>,

    #[serde(default)]
    pub chroma_mean: Vec<f32>,
    #[serde(default)]
    pub chroma_std: Vec<f32>,

    // Spectral shape
    #[serde(default)]
    pub spectral_centroid_mean: f32,
    #[serde(default)]
    pub spectral_centroid_std: f32,
    #[serde(default)]
    pub spectral_bandwidth_mean: f32,
    #[serde(default)]
    pub spectral_rolloff_mean: f32,
    #[serde(default)]
    pub spectral_flatness_mean: f32,

    // Rhythm
    #[serde(default)]
    pub zero_crossing_rate_mean: f32,
    #[serde(default)]
    pub rms_mean: f32,
    #[serde(default)]
    pub tempo: Option<f32>,
    #[serde(default)]
    pub beat_std: Option<f32>,
    #[serde(default)]
    pub pulse_clarity: Option<f32>,

    #[serde(default)]
    pub tonal_features_mean: Vec<f32>,
    #[serde(default)]
    pub centroid_profile: Vec<f32>,
    #[serde(default)]
    pub contrast_profile: Vec<f32>,
    #[serde(default)]
    pub energy_distribution: Vec<f32>,

    #[serde(default)]
    pub fingerprint: Fingerprint,
}

impl Descriptor {
    /// Lightweight projection stored in the index.
    pub fn index_entry(&self) -> IndexEntry {
        IndexEntry {
            id: self.id.clone(),
            file_name: self.file_name.clone(),
            file_path: self.file_path.clone(),
            duration: self.duration_seconds,
            added_time: self.added_time.clone(),
            song_name: self.song_name.clone(),
            author: self.author.clone(),
            cover_path: self.cover_path.clone(),
        }
    }

    /// Apply a metadata patch in place. Returns true if anything changed.
    pub fn apply_patch(&mut self, patch: &MetadataPatch) -> bool {
        let mut changed = false;
        if let Some(song_name) = &patch.song_name {
            changed |= self.song_name != *song_name;
            self.song_name = song_name.clone();
        }
        if let Some(author) = &patch.author {
            changed |= self.author != *author;
            self.author = author.clone();
        }
        if let Some(cover_path) = &patch.cover_path {
            let cover_path = (!cover_path.is_empty()).then(|| cover_path.clone());
            changed |= self.cover_path != cover_path;
            self.cover_path = cover_path;
        }
        changed
    }
}

/// Index value: everything in a [`Descriptor`] except the feature arrays.
///
/// `id` is the key of the index object and is not repeated in the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(skip)]
    pub id: String,
    pub file_name: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub added_time: String,
    #[serde(default)]
    pub song_name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub cover_path: Option<String>,
}

impl IndexEntry {
    pub fn apply_patch(&mut self, patch: &MetadataPatch) {
        if let Some(song_name) = &patch.song_name {
            self.song_name = song_name.clone();
        }
        if let Some(author) = &patch.author {
            self.author = author.clone();
        }
        if let Some(cover_path) = &patch.cover_path {
            self.cover_path = (!cover_path.is_empty()).then(|| cover_path.clone());
        }
    }
}

/// Metadata fields that can be changed without re-extraction.
///
/// An empty `cover_path` clears the cover reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataPatch {
    #[serde(default)]
    pub song_name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub cover_path: Option<String>,
}

impl MetadataPatch {
    pub fn is_empty(&self) -> bool {
        self.song_name.is_none() && self.author.is_none() && self.cover_path.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_id_is_md5_of_file_name() {
        assert_eq!(descriptor_id(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(descriptor_id("song.mp3"), descriptor_id("song.mp3"));
        assert_ne!(descriptor_id("song.mp3"), descriptor_id("song.wav"));
        assert_eq!(descriptor_id("song.mp3").len(), 32);
    }

    #[test]
    fn test_fingerprint_truncates_ragged_rows() {
        let fp = Fingerprint::from_rows(vec![vec![1, 0, 1], vec![0, 2]]);
        assert_eq!(fp.rows(), 2);
        assert_eq!(fp.cols(), 2);
        assert!(fp.get(1, 1));
        assert_eq!(fp.count_ones(), 2);
    }

    #[test]
    fn test_fingerprint_json_is_nested_bit_arrays() {
        let fp = Fingerprint::from_rows(vec![vec![1, 0], vec![0, 1]]);
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, "[[1,0],[0,1]]");
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn test_legacy_record_without_features_loads() {
        let json = r#"{"file_name": "a.mp3", "file_path": "music/a.mp3", "duration": 12.5}"#;
        let d: Descriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.duration_seconds, 12.5);
        assert!(d.fingerprint.is_empty());
        assert!(d.tempo.is_none());
    }

    #[test]
    fn test_patch_clears_cover_with_empty_string() {
        let mut d = Descriptor {
            cover_path: Some("covers/cover_x.png".to_string()),
            ..Default::default()
        };
        let patch = MetadataPatch {
            cover_path: Some(String::new()),
            ..Default::default()
        };
        assert!(d.apply_patch(&patch));
        assert!(d.cover_path.is_none());
    }

    #[test]
    fn test_index_entry_omits_id_from_value() {
        let d = Descriptor {
            id: "abc".to_string(),
            file_name: "a.mp3".to_string(),
            ..Default::default()
        };
        let entry = d.index_entry();
        assert_eq!(entry.id, "abc");
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["file_name"], "a.mp3");
    }
}
