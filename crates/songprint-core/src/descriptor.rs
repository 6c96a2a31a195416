//! Descriptor extraction: decode, segment, analyse and aggregate

use crate::audio::{self, AudioSignal};
use crate::config::SongprintConfig;
use crate::error::ExtractError;
use crate::features::{self, stats, FeatureBank, SegmentFeatures};
use crate::fingerprint::FingerprintBuilder;
use crate::segmentation::segment_audio;
use songprint_fp::{descriptor_id, Descriptor};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default author for freshly ingested files
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Format of `Descriptor::added_time`
pub const ADDED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_timestamp() -> String {
    chrono::Local::now().format(ADDED_TIME_FORMAT).to_string()
}

/// Turns audio into descriptors with a fixed configuration.
pub struct Extractor {
    config: SongprintConfig,
    bank: FeatureBank,
    fingerprints: FingerprintBuilder,
    cancel: Option<Arc<AtomicBool>>,
}

impl Extractor {
    pub fn new(config: SongprintConfig) -> Result<Self, ExtractError> {
        config
            .validate()
            .map_err(|e| ExtractError::Config(e.to_string()))?;
        Ok(Self {
            bank: FeatureBank::new(&config),
            fingerprints: FingerprintBuilder::new(&config),
            config,
            cancel: None,
        })
    }

    /// Abort extraction at the next segment boundary once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &SongprintConfig {
        &self.config
    }

    fn check_cancelled(&self) -> Result<(), ExtractError> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(ExtractError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Decode and analyse an audio file.
    pub fn extract(&self, path: &Path) -> Result<Descriptor, ExtractError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ExtractError::Decode {
                path: path.to_path_buf(),
                reason: "path has no UTF-8 file name".to_string(),
            })?;

        log::info!("Extracting features from {}", path.display());
        let signal =
            audio::decode_audio(path, self.config.sample_rate).map_err(|e| ExtractError::Decode {
                path: path.to_path_buf(),
                reason: format!("{:#}", e),
            })?;

        self.extract_from_signal(&signal, file_name, &path.to_string_lossy())
    }

    /// Analyse an already decoded signal.
    ///
    /// The signal is resampled if its rate differs from the configured one.
    pub fn extract_from_signal(
        &self,
        signal: &AudioSignal,
        file_name: &str,
        file_path: &str,
    ) -> Result<Descriptor, ExtractError> {
        self.check_cancelled()?;

        let samples = if signal.sample_rate == self.config.sample_rate {
            std::borrow::Cow::Borrowed(&signal.samples)
        } else {
            let resampled =
                audio::resample_to_target(&signal.samples, signal.sample_rate, self.config.sample_rate)
                    .map_err(|e| ExtractError::Config(e.to_string()))?;
            std::borrow::Cow::Owned(resampled)
        };

        let segments = segment_audio(&samples, &self.config);
        log::debug!("{}: {} analysis segment(s)", file_name, segments.len());

        let mut analysed = Vec::with_capacity(segments.len());
        for segment in &segments {
            self.check_cancelled()?;
            analysed.push(self.bank.analyze(&segment.samples));
        }
        self.check_cancelled()?;

        let fingerprint = self.fingerprints.build(analysed.iter().map(|s| &s.mel_db));
        let mut descriptor = aggregate(&analysed);
        descriptor.energy_distribution =
            features::energy_distribution(&samples, self.config.energy_buckets);
        descriptor.fingerprint = fingerprint;

        descriptor.id = descriptor_id(file_name);
        descriptor.file_name = file_name.to_string();
        descriptor.file_path = file_path.to_string();
        descriptor.duration_seconds = samples.len() as f64 / self.config.sample_rate as f64;
        descriptor.added_time = now_timestamp();
        descriptor.song_name = file_stem(file_name);
        descriptor.author = UNKNOWN_ARTIST.to_string();

        log::info!(
            "Extracted {} ({:.1}s, fingerprint {}x{})",
            file_name,
            descriptor.duration_seconds,
            descriptor.fingerprint.rows(),
            descriptor.fingerprint.cols()
        );
        Ok(descriptor)
    }
}

/// File name without its final extension.
pub fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

/// Average per-segment features into the feature fields of a descriptor.
fn aggregate(segments: &[SegmentFeatures]) -> Descriptor {
    let scalar = |f: fn(&SegmentFeatures) -> f32| {
        let values: Vec<f32> = segments.iter().map(f).collect();
        stats::mean(&values)
    };
    let optional = |f: fn(&SegmentFeatures) -> Option<f32>| {
        let values: Vec<f32> = segments.iter().filter_map(f).collect();
        (!values.is_empty()).then(|| stats::mean(&values))
    };

    Descriptor {
        mel_mean: stats::average_vectors(segments.iter().map(|s| &s.mel.mean)),
        mel_std: stats::average_vectors(segments.iter().map(|s| &s.mel.std)),
        mel_skew: stats::average_vectors(segments.iter().map(|s| &s.mel.skew)),
        mfcc_mean: stats::average_vectors(segments.iter().map(|s| &s.mfcc.mean)),
        mfcc_std: stats::average_vectors(segments.iter().map(|s| &s.mfcc.std)),
        mfcc_skew: stats::average_vectors(segments.iter().map(|s| &s.mfcc.skew)),
        chroma_mean: stats::average_vectors(segments.iter().map(|s| &s.chroma_mean)),
        chroma_std: stats::average_vectors(segments.iter().map(|s| &s.chroma_std)),
        spectral_centroid_mean: scalar(|s| s.spectral.centroid_mean),
        spectral_centroid_std: scalar(|s| s.spectral.centroid_std),
        spectral_bandwidth_mean: scalar(|s| s.spectral.bandwidth_mean),
        spectral_rolloff_mean: scalar(|s| s.spectral.rolloff_mean),
        spectral_flatness_mean: scalar(|s| s.spectral.flatness_mean),
        zero_crossing_rate_mean: scalar(|s| s.rhythm.zero_crossing_rate_mean),
        rms_mean: scalar(|s| s.rhythm.rms_mean),
        tempo: optional(|s| s.rhythm.tempo),
        beat_std: optional(|s| s.rhythm.beat_std),
        pulse_clarity: optional(|s| Some(s.rhythm.pulse_clarity)),
        tonal_features_mean: stats::average_vectors(segments.iter().map(|s| &s.tonal_mean)),
        centroid_profile: stats::average_vectors(
            segments.iter().map(|s| &s.spectral.centroid_profile),
        ),
        contrast_profile: stats::average_vectors(segments.iter().map(|s| &s.spectral.contrast)),
        ..Default::default()
    }
}

/// Extract a descriptor from an audio file.
pub fn extract(path: &Path, config: &SongprintConfig) -> Result<Descriptor, ExtractError> {
    Extractor::new(config.clone())?.extract(path)
}

/// Extract a descriptor from decoded samples.
pub fn extract_from_signal(
    signal: &AudioSignal,
    file_name: &str,
    config: &SongprintConfig,
) -> Result<Descriptor, ExtractError> {
    Extractor::new(config.clone())?.extract_from_signal(signal, file_name, file_name)
}
