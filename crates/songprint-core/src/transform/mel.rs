//! Mel filterbank (HTK mel scale, Slaney area normalization)

use super::{Matrix, Spectrogram};
use crate::config::SongprintConfig;

pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular filters spanning 0 Hz to Nyquist.
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    /// Weights [mel_band][fft_bin]
    weights: Matrix,
}

impl MelFilterBank {
    pub fn new(config: &SongprintConfig) -> Self {
        let num_bins = config.n_fft / 2 + 1;
        let n_mels = config.n_mels;
        let nyquist = config.sample_rate as f32 / 2.0;

        let max_mel = hz_to_mel(nyquist);
        let edges: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(max_mel * i as f32 / (n_mels + 1) as f32))
            .collect();

        let weights = (0..n_mels)
            .map(|m| {
                let (lo, mid, hi) = (edges[m], edges[m + 1], edges[m + 2]);
                let enorm = 2.0 / (hi - lo);
                (0..num_bins)
                    .map(|k| {
                        let f = config.bin_frequency(k);
                        let lower = (f - lo) / (mid - lo);
                        let upper = (hi - f) / (hi - mid);
                        lower.min(upper).max(0.0) * enorm
                    })
                    .collect()
            })
            .collect();

        Self { weights }
    }

    pub fn num_bands(&self) -> usize {
        self.weights.len()
    }

    /// Project a power spectrogram onto the mel bands.
    pub fn apply(&self, spec: &Spectrogram) -> Matrix {
        self.weights
            .iter()
            .map(|filter| {
                let mut band = vec![0.0f32; spec.num_frames];
                for (w, row) in filter.iter().zip(&spec.power) {
                    if *w == 0.0 {
                        continue;
                    }
                    for (acc, p) in band.iter_mut().zip(row) {
                        *acc += w * p;
                    }
                }
                band
            })
            .collect()
    }
}
