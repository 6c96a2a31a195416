//! Configuration parameters for extraction and matching
//!
//! Extraction defaults follow the common librosa analysis settings
//! (22.05 kHz, 2048-point FFT, hop of 512, 128 mel bands).

use serde::{Deserialize, Serialize};

/// Feature extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongprintConfig {
    // Signal
    pub sample_rate: u32,

    // Spectral transform
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mels: usize,
    pub top_db: f32,

    // Segmentation
    pub max_segments: usize,
    pub segment_max_seconds: f32,

    // Feature bank
    pub n_mfcc: usize,
    pub n_chroma: usize,
    pub chroma_min_freq: f32,
    pub chroma_octaves: usize,
    pub contrast_bands: usize,
    pub contrast_min_freq: f32,
    pub rolloff_percent: f32,
    pub centroid_lags: usize,
    pub energy_buckets: usize,
    pub min_bpm: f32,
    pub max_bpm: f32,
    pub start_bpm: f32,

    // Fingerprint
    pub fp_freq_step: usize,
    pub fp_time_step: usize,
    pub fp_window: usize,
    pub fp_threshold_factor: f32,
}

impl Default for SongprintConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,

            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            top_db: 80.0,

            max_segments: 3,
            segment_max_seconds: 10.0,

            n_mfcc: 40,
            n_chroma: 36,
            chroma_min_freq: 32.703,
            chroma_octaves: 7,
            contrast_bands: 6,
            contrast_min_freq: 200.0,
            rolloff_percent: 0.85,
            centroid_lags: 20,
            energy_buckets: 10,
            min_bpm: 30.0,
            max_bpm: 300.0,
            start_bpm: 120.0,

            fp_freq_step: 2,
            fp_time_step: 4,
            fp_window: 5,
            fp_threshold_factor: 1.5,
        }
    }
}

impl SongprintConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sample_rate == 0 {
            anyhow::bail!("sample_rate must be > 0");
        }
        if self.n_fft < 16 || !self.n_fft.is_power_of_two() {
            anyhow::bail!("n_fft must be a power of two >= 16");
        }
        if self.hop_length == 0 || self.hop_length > self.n_fft {
            anyhow::bail!("hop_length must be in 1..=n_fft");
        }
        if self.n_mels == 0 || self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            anyhow::bail!("n_mfcc must be in 1..=n_mels");
        }
        if self.n_chroma == 0 || self.n_chroma % 12 != 0 {
            anyhow::bail!("n_chroma must be a positive multiple of 12");
        }
        if self.max_segments == 0 {
            anyhow::bail!("max_segments must be > 0");
        }
        if self.fp_freq_step == 0 || self.fp_time_step == 0 {
            anyhow::bail!("fingerprint steps must be > 0");
        }
        if !(0.0..=1.0).contains(&self.rolloff_percent) {
            anyhow::bail!("rolloff_percent must be within [0, 1]");
        }
        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            anyhow::bail!("min_bpm must be > 0 and < max_bpm");
        }
        if self.energy_buckets == 0 || self.centroid_lags == 0 {
            anyhow::bail!("energy_buckets and centroid_lags must be > 0");
        }
        Ok(())
    }

    /// Frequency (Hz) of FFT bin `k`.
    pub fn bin_frequency(&self, k: usize) -> f32 {
        k as f32 * self.sample_rate as f32 / self.n_fft as f32
    }
}

/// Relative weight of each sub-score in the fused similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub fingerprint: f64,
    pub mfcc: f64,
    pub mfcc_std: f64,
    pub mfcc_skew: f64,
    pub chroma: f64,
    pub tonal: f64,
    pub tempo: f64,
    pub pulse_clarity: f64,
    pub mel: f64,
    pub mel_skew: f64,
    pub spectral_profile: f64,
    pub energy: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            fingerprint: 1.2,
            mfcc: 1.0,
            mfcc_std: 0.5,
            mfcc_skew: 0.8,
            chroma: 0.9,
            tonal: 0.85,
            tempo: 0.4,
            pulse_clarity: 0.24,
            mel: 0.7,
            mel_skew: 0.49,
            spectral_profile: 0.6,
            energy: 0.5,
        }
    }
}

impl FeatureWeights {
    fn all(&self) -> [f64; 12] {
        [
            self.fingerprint,
            self.mfcc,
            self.mfcc_std,
            self.mfcc_skew,
            self.chroma,
            self.tonal,
            self.tempo,
            self.pulse_clarity,
            self.mel,
            self.mel_skew,
            self.spectral_profile,
            self.energy,
        ]
    }
}

/// Matching configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum fused score for a candidate to be reported as a match
    pub accept_threshold: f64,
    /// Confidence reported when the store is empty
    pub fallback_confidence: f64,
    /// Upper bound on the fingerprint column shift
    pub max_fingerprint_offset: usize,
    /// Tempo difference (BPM) at which the tempo score reaches 0
    pub tempo_range: f64,
    pub pulse_epsilon: f64,
    pub weights: FeatureWeights,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.5,
            fallback_confidence: 0.3,
            max_fingerprint_offset: 5,
            tempo_range: 180.0 - 73.0,
            pulse_epsilon: 0.001,
            weights: FeatureWeights::default(),
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            anyhow::bail!("accept_threshold must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.fallback_confidence) {
            anyhow::bail!("fallback_confidence must be within [0, 1]");
        }
        if self.tempo_range <= 0.0 || self.pulse_epsilon <= 0.0 {
            anyhow::bail!("tempo_range and pulse_epsilon must be > 0");
        }
        if self.weights.all().iter().any(|w| !w.is_finite() || *w < 0.0) {
            anyhow::bail!("feature weights must be finite and non-negative");
        }
        Ok(())
    }
}
