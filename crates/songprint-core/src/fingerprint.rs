//! Binary fingerprint construction
//!
//! The dB mel spectrograms of all segments are concatenated in time,
//! decimated, binarized against a sliding local mean and cleaned of
//! isolated bits.

use crate::config::SongprintConfig;
use crate::transform::Matrix;
use songprint_fp::Fingerprint;

/// Neighbour count at or above which a 0 becomes 1
const FILL_NEIGHBOURS: usize = 6;
/// Neighbour count at or below which a 1 becomes 0
const CLEAR_NEIGHBOURS: usize = 2;

pub struct FingerprintBuilder {
    freq_step: usize,
    time_step: usize,
    window: usize,
    threshold_factor: f32,
}

impl FingerprintBuilder {
    pub fn new(config: &SongprintConfig) -> Self {
        Self {
            freq_step: config.fp_freq_step,
            time_step: config.fp_time_step,
            window: config.fp_window,
            threshold_factor: config.fp_threshold_factor,
        }
    }

    /// Build the fingerprint of one or more dB mel spectrograms.
    ///
    /// Shape: `ceil(n_mels / freq_step) x ceil(total_frames / time_step)`.
    pub fn build<'a, I>(&self, segments: I) -> Fingerprint
    where
        I: IntoIterator<Item = &'a Matrix>,
    {
        let combined = concatenate(segments);
        let reduced = self.decimate(&combined);
        let bits = self.binarize(&reduced);
        denoise(bits)
    }

    fn decimate(&self, matrix: &Matrix) -> Matrix {
        matrix
            .iter()
            .step_by(self.freq_step)
            .map(|row| row.iter().step_by(self.time_step).copied().collect())
            .collect()
    }

    /// Compare each cell against a weighted blend of itself and the mean of
    /// `[j - window, j + window]` in its row.
    fn binarize(&self, matrix: &Matrix) -> Fingerprint {
        let rows: Vec<Vec<u8>> = matrix
            .iter()
            .map(|row| {
                let cols = row.len();
                (0..cols)
                    .map(|j| {
                        let lo = j.saturating_sub(self.window);
                        let hi = (j + self.window + 1).min(cols);
                        let window = &row[lo..hi];
                        let local_mean = window.iter().sum::<f32>() / window.len() as f32;
                        let v = row[j];
                        let threshold = (local_mean + self.threshold_factor * v)
                            / (1.0 + self.threshold_factor);
                        u8::from(v > threshold)
                    })
                    .collect()
            })
            .collect();
        Fingerprint::from_rows(rows)
    }
}

fn concatenate<'a, I>(segments: I) -> Matrix
where
    I: IntoIterator<Item = &'a Matrix>,
{
    let mut combined: Matrix = Vec::new();
    for segment in segments {
        if combined.is_empty() {
            combined = segment.clone();
            continue;
        }
        for (row, extra) in combined.iter_mut().zip(segment) {
            row.extend_from_slice(extra);
        }
    }
    combined
}

/// One pass over interior cells, reading neighbours from a snapshot.
fn denoise(snapshot: Fingerprint) -> Fingerprint {
    let (rows, cols) = (snapshot.rows(), snapshot.cols());
    if rows < 3 || cols < 3 {
        return snapshot;
    }
    let mut out = snapshot.clone();
    for i in 1..rows - 1 {
        for j in 1..cols - 1 {
            let mut neighbours = 0;
            for di in [i - 1, i, i + 1] {
                for dj in [j - 1, j, j + 1] {
                    if (di, dj) != (i, j) && snapshot.get(di, dj) {
                        neighbours += 1;
                    }
                }
            }
            if snapshot.get(i, j) {
                if neighbours <= CLEAR_NEIGHBOURS {
                    out.set(i, j, false);
                }
            } else if neighbours >= FILL_NEIGHBOURS {
                out.set(i, j, true);
            }
        }
    }
    out
}
