//! Short-time spectral transforms
//!
//! Centered STFT power spectrogram with a periodic Hann window, plus the
//! mel and constant-Q reductions built on top of it. Matrices are stored
//! row-major as `[bin][frame]`.

mod cqt;
mod mel;

pub use cqt::ConstantQPooling;
pub use mel::{hz_to_mel, mel_to_hz, MelFilterBank};

use crate::config::SongprintConfig;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Row-major real matrix, one row per frequency bin.
pub type Matrix = Vec<Vec<f32>>;

/// Power spectrogram `|X|^2`
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Power values [frequency_bin][time_frame]
    pub power: Matrix,
    /// Number of time frames
    pub num_frames: usize,
    /// Number of frequency bins (n_fft / 2 + 1)
    pub num_bins: usize,
}

impl Spectrogram {
    /// Magnitude `|X|` of every cell.
    pub fn magnitude(&self) -> Matrix {
        self.power
            .iter()
            .map(|row| row.iter().map(|p| p.sqrt()).collect())
            .collect()
    }

    /// Column `t` as a vector over frequency bins.
    pub fn frame(&self, t: usize) -> Vec<f32> {
        self.power.iter().map(|row| row[t]).collect()
    }
}

/// Number of frames a centered STFT produces for `len` samples.
pub fn num_frames(len: usize, hop_length: usize) -> usize {
    1 + len / hop_length
}

/// Reusable STFT plan.
pub struct Stft {
    n_fft: usize,
    hop_length: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl Stft {
    pub fn new(config: &SongprintConfig) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.n_fft);
        Self {
            n_fft: config.n_fft,
            hop_length: config.hop_length,
            window: create_hann_window(config.n_fft),
            fft,
        }
    }

    /// Compute the centered power spectrogram of `samples`.
    ///
    /// The signal is zero-padded by `n_fft / 2` on both sides so frame `t`
    /// is centred on sample `t * hop_length`.
    pub fn power(&self, samples: &[f32]) -> Spectrogram {
        let pad = self.n_fft / 2;
        let frames = num_frames(samples.len(), self.hop_length);
        let num_bins = self.n_fft / 2 + 1;

        let mut power = vec![vec![0.0f32; frames]; num_bins];
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];

        for t in 0..frames {
            let center = t * self.hop_length;
            for (i, slot) in buffer.iter_mut().enumerate() {
                // Index into the virtual padded signal
                let sample = (center + i)
                    .checked_sub(pad)
                    .and_then(|idx| samples.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                *slot = Complex::new(sample * self.window[i], 0.0);
            }
            self.fft.process(&mut buffer);
            for (k, row) in power.iter_mut().enumerate() {
                row[t] = buffer[k].norm_sqr();
            }
        }

        Spectrogram {
            power,
            num_frames: frames,
            num_bins,
        }
    }

    /// Centered time-domain frames (same framing as [`Stft::power`], no window).
    pub fn frames<'a>(&'a self, samples: &'a [f32]) -> impl Iterator<Item = Vec<f32>> + 'a {
        let pad = self.n_fft / 2;
        (0..num_frames(samples.len(), self.hop_length)).map(move |t| {
            let center = t * self.hop_length;
            (0..self.n_fft)
                .map(|i| {
                    (center + i)
                        .checked_sub(pad)
                        .and_then(|idx| samples.get(idx))
                        .copied()
                        .unwrap_or(0.0)
                })
                .collect()
        })
    }
}

/// Periodic Hann window
fn create_hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / size as f32).cos())
        .collect()
}

/// Convert a power matrix to decibels in place.
///
/// `10 * log10(max(x, amin))` relative to a reference of 1, then floored at
/// `max - top_db`.
pub fn power_to_db(matrix: &mut Matrix, top_db: f32) {
    const AMIN: f32 = 1e-10;
    let mut max_db = f32::NEG_INFINITY;
    for row in matrix.iter_mut() {
        for v in row.iter_mut() {
            *v = 10.0 * v.max(AMIN).log10();
            max_db = max_db.max(*v);
        }
    }
    if top_db > 0.0 && max_db.is_finite() {
        let floor = max_db - top_db;
        matrix
            .iter_mut()
            .flat_map(|row| row.iter_mut())
            .for_each(|v| *v = v.max(floor));
    }
}
