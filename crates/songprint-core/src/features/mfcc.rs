//! MFCC with first and second order deltas

use crate::transform::Matrix;
use std::f32::consts::PI;

/// Half-width of the delta regression window (width 9).
const DELTA_N: usize = 4;

/// Orthonormal DCT-II from mel bands to cepstral coefficients.
#[derive(Debug, Clone)]
pub struct Mfcc {
    /// Basis [coefficient][mel_band]
    basis: Matrix,
}

impl Mfcc {
    pub fn new(n_mfcc: usize, n_mels: usize) -> Self {
        let n = n_mels as f32;
        let basis = (0..n_mfcc)
            .map(|k| {
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..n_mels)
                    .map(|m| scale * (PI * k as f32 * (2 * m + 1) as f32 / (2.0 * n)).cos())
                    .collect()
            })
            .collect();
        Self { basis }
    }

    /// Cepstral coefficients of a dB mel spectrogram: `[n_mfcc][frames]`.
    pub fn coefficients(&self, mel_db: &Matrix) -> Matrix {
        let frames = mel_db.first().map_or(0, Vec::len);
        self.basis
            .iter()
            .map(|basis_row| {
                let mut out = vec![0.0f32; frames];
                for (w, mel_row) in basis_row.iter().zip(mel_db) {
                    for (acc, v) in out.iter_mut().zip(mel_row) {
                        *acc += w * v;
                    }
                }
                out
            })
            .collect()
    }

    /// Coefficients stacked with their deltas and delta-deltas.
    pub fn stacked(&self, mel_db: &Matrix) -> Matrix {
        let mfcc = self.coefficients(mel_db);
        let d1 = delta(&mfcc);
        let d2 = delta(&d1);
        mfcc.into_iter().chain(d1).chain(d2).collect()
    }
}

/// Regression delta along time with edge replication.
pub fn delta(matrix: &Matrix) -> Matrix {
    let denom = 2.0 * (1..=DELTA_N).map(|n| (n * n) as f32).sum::<f32>();
    matrix
        .iter()
        .map(|row| {
            let last = row.len().saturating_sub(1);
            (0..row.len())
                .map(|t| {
                    (1..=DELTA_N)
                        .map(|n| {
                            let ahead = row[(t + n).min(last)];
                            let behind = row[t.saturating_sub(n)];
                            n as f32 * (ahead - behind)
                        })
                        .sum::<f32>()
                        / denom
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dct_basis_is_orthonormal() {
        let mfcc = Mfcc::new(40, 128);
        for i in 0..40 {
            for j in 0..40 {
                let dot: f32 = mfcc.basis[i].iter().zip(&mfcc.basis[j]).map(|(a, b)| a * b).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(dot, expected, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_constant_spectrum_has_only_dc() {
        let mfcc = Mfcc::new(13, 32);
        let coeffs = mfcc.coefficients(&vec![vec![-20.0; 5]; 32]);
        assert_relative_eq!(coeffs[0][0], -20.0 * 32f32.sqrt(), epsilon = 1e-3);
        assert!(coeffs[1..].iter().all(|row| row[0].abs() < 1e-3));
    }

    #[test]
    fn test_delta_of_ramp_is_one_in_interior() {
        let ramp: Vec<f32> = (0..20).map(|t| t as f32).collect();
        let d = delta(&vec![ramp]);
        assert_relative_eq!(d[0][10], 1.0, epsilon = 1e-5);
        // Edge replication flattens the slope at the boundary
        assert!(d[0][0] < 1.0);
    }

    #[test]
    fn test_stacked_has_three_blocks() {
        let mfcc = Mfcc::new(40, 128);
        let stacked = mfcc.stacked(&vec![vec![0.0; 7]; 128]);
        assert_eq!(stacked.len(), 120);
        assert!(stacked.iter().all(|row| row.len() == 7));
    }
}
