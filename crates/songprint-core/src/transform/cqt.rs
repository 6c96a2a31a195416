//! Constant-Q pooling of STFT power
//!
//! Each FFT bin is assigned to the nearest log-spaced band
//! `fmin * 2^(k / bins_per_octave)`; band power is the sum of its bins.

use super::{Matrix, Spectrogram};
use crate::config::SongprintConfig;

#[derive(Debug, Clone)]
pub struct ConstantQPooling {
    /// Band index for each FFT bin, `None` outside the covered range
    assignment: Vec<Option<usize>>,
    num_bands: usize,
    bins_per_octave: usize,
}

impl ConstantQPooling {
    pub fn new(config: &SongprintConfig) -> Self {
        let bins_per_octave = config.n_chroma;
        let num_bands = bins_per_octave * config.chroma_octaves;
        let num_bins = config.n_fft / 2 + 1;

        let assignment = (0..num_bins)
            .map(|k| {
                let f = config.bin_frequency(k);
                if f <= 0.0 {
                    return None;
                }
                let band = (bins_per_octave as f32 * (f / config.chroma_min_freq).log2()).round();
                (band >= 0.0 && (band as usize) < num_bands).then_some(band as usize)
            })
            .collect();

        Self {
            assignment,
            num_bands,
            bins_per_octave,
        }
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn bins_per_octave(&self) -> usize {
        self.bins_per_octave
    }

    /// Pool power into constant-Q bands: `[band][frame]`.
    pub fn apply(&self, spec: &Spectrogram) -> Matrix {
        let mut bands = vec![vec![0.0f32; spec.num_frames]; self.num_bands];
        for (row, band) in spec.power.iter().zip(&self.assignment) {
            if let Some(b) = band {
                for (acc, p) in bands[*b].iter_mut().zip(row) {
                    *acc += p;
                }
            }
        }
        bands
    }
}
