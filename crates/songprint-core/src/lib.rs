//! Songprint Core - audio descriptor extraction and similarity matching
//!
//! Decodes an audio file, analyses up to three evenly spaced segments,
//! aggregates timbre / harmony / rhythm / spectral statistics plus a binary
//! spectro-temporal fingerprint into a [`Descriptor`], persists descriptors
//! in a [`FeatureStore`] and ranks stored descriptors against a query.

pub mod audio;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod features;
pub mod fingerprint;
pub mod matching;
pub mod segmentation;
pub mod storage_backend;
pub mod storage_config;
pub mod transform;

pub use config::{FeatureWeights, MatchConfig, SongprintConfig};
pub use descriptor::{extract, extract_from_signal, Extractor};
pub use error::{ExtractError, StoreError};
pub use matching::{MatchResult, Matcher, Similarity};
pub use segmentation::{segment_audio, AudioSegment};
pub use songprint_fp::{descriptor_id, Descriptor, Fingerprint, IndexEntry, MetadataPatch};
pub use storage_backend::{open_store, FeatureStore, FilesystemStore, MemoryStore, RepairReport};
pub use storage_config::SongprintStorageConfig;

/// Rank every descriptor in `store` against `descriptor`.
pub fn match_descriptor(
    descriptor: &Descriptor,
    store: &dyn FeatureStore,
    config: &MatchConfig,
) -> MatchResult {
    Matcher::new(config.clone()).best_match(descriptor, store)
}

/// Extract a descriptor from `path` and match it against `store`.
pub fn match_file(
    path: &std::path::Path,
    store: &dyn FeatureStore,
    config: &SongprintStorageConfig,
) -> Result<(Descriptor, MatchResult), ExtractError> {
    let query = extract(path, &config.extraction)?;
    let result = match_descriptor(&query, store, &config.matching);
    Ok((query, result))
}
