//! Per-segment feature bank
//!
//! [`FeatureBank`] holds the transform plans shared by every segment of a
//! signal and turns one segment into a [`SegmentFeatures`].

pub mod chroma;
pub mod mfcc;
pub mod rhythm;
pub mod spectral;
pub mod stats;
pub mod tonal;

pub use rhythm::RhythmFeatures;
pub use spectral::SpectralShape;
pub use stats::RowStats;

use crate::config::SongprintConfig;
use crate::transform::{power_to_db, ConstantQPooling, Matrix, MelFilterBank, Stft};
use mfcc::Mfcc;
use rhythm::RhythmAnalyzer;
use spectral::SpectralAnalyzer;

/// Everything computed from one analysis segment
#[derive(Debug, Clone)]
pub struct SegmentFeatures {
    pub mel: RowStats,
    pub mfcc: RowStats,
    pub chroma_mean: Vec<f32>,
    pub chroma_std: Vec<f32>,
    pub spectral: SpectralShape,
    pub rhythm: RhythmFeatures,
    pub tonal_mean: Vec<f32>,
    /// dB mel spectrogram, kept for fingerprinting
    pub mel_db: Matrix,
}

pub struct FeatureBank {
    top_db: f32,
    stft: Stft,
    mel_bank: MelFilterBank,
    pooling: ConstantQPooling,
    mfcc: Mfcc,
    spectral: SpectralAnalyzer,
    rhythm: RhythmAnalyzer,
}

impl FeatureBank {
    pub fn new(config: &SongprintConfig) -> Self {
        Self {
            top_db: config.top_db,
            stft: Stft::new(config),
            mel_bank: MelFilterBank::new(config),
            pooling: ConstantQPooling::new(config),
            mfcc: Mfcc::new(config.n_mfcc, config.n_mels),
            spectral: SpectralAnalyzer::new(config),
            rhythm: RhythmAnalyzer::new(config),
        }
    }

    pub fn analyze(&self, samples: &[f32]) -> SegmentFeatures {
        let spec = self.stft.power(samples);

        let mut mel_db = self.mel_bank.apply(&spec);
        power_to_db(&mut mel_db, self.top_db);

        let mfcc = stats::row_stats(&self.mfcc.stacked(&mel_db));
        let chroma = chroma::chromagram(&spec, &self.pooling);
        let chroma_stats = stats::row_stats(&chroma);
        let tonal_mean = stats::row_means(&tonal::tonnetz(&chroma));

        log::debug!(
            "Segment of {} samples: {} frames, {} mel bands",
            samples.len(),
            spec.num_frames,
            mel_db.len()
        );

        SegmentFeatures {
            mel: stats::row_stats(&mel_db),
            mfcc,
            chroma_mean: chroma_stats.mean,
            chroma_std: chroma_stats.std,
            spectral: self.spectral.analyze(&spec),
            rhythm: self.rhythm.analyze(samples, &self.stft, &mel_db),
            tonal_mean,
            mel_db,
        }
    }
}

/// Share of total energy in each of `buckets` equal time slices.
///
/// Sums to 1, or is all zero for a silent signal.
pub fn energy_distribution(samples: &[f32], buckets: usize) -> Vec<f32> {
    let len = samples.len();
    let energies: Vec<f64> = (0..buckets)
        .map(|i| {
            let (start, end) = (i * len / buckets, (i + 1) * len / buckets);
            samples[start..end].iter().map(|&x| (x as f64).powi(2)).sum()
        })
        .collect();
    let total: f64 = energies.iter().sum();
    if total <= 0.0 {
        return vec![0.0; buckets];
    }
    energies.iter().map(|e| (e / total) as f32).collect()
}
