//! Spectral shape descriptors

use super::stats;
use crate::config::SongprintConfig;
use crate::transform::{Matrix, Spectrogram};

const AMIN: f32 = 1e-10;
const CONTRAST_QUANTILE: f32 = 0.02;

/// Per-segment spectral shape summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralShape {
    pub centroid_mean: f32,
    pub centroid_std: f32,
    pub bandwidth_mean: f32,
    pub rolloff_mean: f32,
    pub flatness_mean: f32,
    /// Mean octave-band contrast, one value per band
    pub contrast: Vec<f32>,
    /// Leading lags of the centroid autocorrelation
    pub centroid_profile: Vec<f32>,
}

pub struct SpectralAnalyzer {
    freqs: Vec<f32>,
    rolloff_percent: f32,
    centroid_lags: usize,
    /// FFT bin membership of each contrast band
    contrast_bands: Vec<Vec<usize>>,
}

impl SpectralAnalyzer {
    pub fn new(config: &SongprintConfig) -> Self {
        let num_bins = config.n_fft / 2 + 1;
        let freqs: Vec<f32> = (0..num_bins).map(|k| config.bin_frequency(k)).collect();
        Self {
            contrast_bands: contrast_bands(&freqs, config.contrast_bands, config.contrast_min_freq),
            freqs,
            rolloff_percent: config.rolloff_percent,
            centroid_lags: config.centroid_lags,
        }
    }

    pub fn analyze(&self, spec: &Spectrogram) -> SpectralShape {
        let magnitude = spec.magnitude();
        let frames = spec.num_frames;

        let mut centroid = Vec::with_capacity(frames);
        let mut bandwidth = Vec::with_capacity(frames);
        let mut rolloff = Vec::with_capacity(frames);
        let mut flatness = Vec::with_capacity(frames);

        for t in 0..frames {
            let column: Vec<f32> = magnitude.iter().map(|row| row[t]).collect();
            let total: f32 = column.iter().sum();

            let c = if total > 0.0 {
                column.iter().zip(&self.freqs).map(|(s, f)| s * f).sum::<f32>() / total
            } else {
                0.0
            };
            centroid.push(c);

            bandwidth.push(if total > 0.0 {
                column
                    .iter()
                    .zip(&self.freqs)
                    .map(|(s, f)| s / total * (f - c).powi(2))
                    .sum::<f32>()
                    .sqrt()
            } else {
                0.0
            });

            rolloff.push(self.rolloff_frequency(&column, total));
            flatness.push(flatness_of(spec.power.iter().map(|row| row[t])));
        }

        let contrast = self
            .contrast_bands
            .iter()
            .map(|band| {
                let per_frame: Vec<f32> = (0..frames)
                    .map(|t| band_contrast(band.iter().map(|&k| magnitude[k][t]).collect()))
                    .collect();
                stats::mean(&per_frame)
            })
            .collect();

        SpectralShape {
            centroid_mean: stats::mean(&centroid),
            centroid_std: stats::std(&centroid),
            bandwidth_mean: stats::mean(&bandwidth),
            rolloff_mean: stats::mean(&rolloff),
            flatness_mean: stats::mean(&flatness),
            contrast,
            centroid_profile: autocorrelation_profile(&centroid, self.centroid_lags),
        }
    }

    fn rolloff_frequency(&self, column: &[f32], total: f32) -> f32 {
        if total <= 0.0 {
            return 0.0;
        }
        let target = self.rolloff_percent * total;
        let mut cumulative = 0.0;
        for (s, f) in column.iter().zip(&self.freqs) {
            cumulative += s;
            if cumulative >= target {
                return *f;
            }
        }
        self.freqs.last().copied().unwrap_or(0.0)
    }
}

/// Geometric over arithmetic mean of the power spectrum.
fn flatness_of(power: impl Iterator<Item = f32>) -> f32 {
    let mut n = 0usize;
    let mut log_sum = 0.0f64;
    let mut sum = 0.0f64;
    for p in power {
        let p = p.max(AMIN) as f64;
        log_sum += p.ln();
        sum += p;
        n += 1;
    }
    if n == 0 {
        return 0.0;
    }
    ((log_sum / n as f64).exp() / (sum / n as f64)) as f32
}

/// Octave bands `[0, fmin], [fmin, 2 fmin], ...`; the last band runs to Nyquist.
///
/// Every band after the first also takes the bin just below its lower
/// edge, and every band but the last drops its top bin.
fn contrast_bands(freqs: &[f32], n_bands: usize, fmin: f32) -> Vec<Vec<usize>> {
    let mut edges = vec![0.0f32];
    edges.extend((0..=n_bands).map(|i| fmin * 2f32.powi(i as i32)));

    edges
        .windows(2)
        .enumerate()
        .filter_map(|(b, edge)| {
            let mut idx: Vec<usize> = (0..freqs.len())
                .filter(|&k| freqs[k] >= edge[0] && freqs[k] <= edge[1])
                .collect();
            let first = *idx.first()?;
            if b > 0 && first > 0 {
                idx.insert(0, first - 1);
            }
            if b == n_bands {
                let last = *idx.last()?;
                idx.extend(last + 1..freqs.len());
            } else {
                idx.pop();
            }
            (!idx.is_empty()).then_some(idx)
        })
        .collect()
}

/// Peak-to-valley contrast (dB) of one band in one frame.
fn band_contrast(mut values: Vec<f32>) -> f32 {
    values.sort_by(f32::total_cmp);
    let n = values.len();
    let q = ((CONTRAST_QUANTILE * n as f32).round() as usize).clamp(1, n);
    let valley = stats::mean(&values[..q]);
    let peak = stats::mean(&values[n - q..]);
    10.0 * peak.max(AMIN).log10() - 10.0 * valley.max(AMIN).log10()
}

/// Biased autocorrelation of the z-scored sequence at lags `0..lags`.
///
/// A constant sequence yields all zeros; missing lags are zero-padded.
pub fn autocorrelation_profile(sequence: &[f32], lags: usize) -> Vec<f32> {
    let mut profile = vec![0.0f32; lags];
    let n = sequence.len();
    let mean = stats::mean(sequence);
    let std = stats::std(sequence);
    if n == 0 || std <= f32::EPSILON * mean.abs().max(1.0) {
        return profile;
    }
    let z: Vec<f32> = sequence.iter().map(|x| (x - mean) / std).collect();
    for (lag, slot) in profile.iter_mut().enumerate().take(n) {
        *slot = z.iter().zip(&z[lag..]).map(|(a, b)| a * b).sum::<f32>() / n as f32;
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Stft;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn tone(freq: f32) -> Vec<f32> {
        (0..22050)
            .map(|i| (2.0 * PI * freq * i as f32 / 22050.0).sin())
            .collect()
    }

    #[test]
    fn test_centroid_tracks_pitch() {
        let config = SongprintConfig::default();
        let stft = Stft::new(&config);
        let analyzer = SpectralAnalyzer::new(&config);

        let low = analyzer.analyze(&stft.power(&tone(440.0)));
        let high = analyzer.analyze(&stft.power(&tone(2000.0)));
        assert!(low.centroid_mean < high.centroid_mean);
        assert!((low.centroid_mean - 440.0).abs() < 300.0, "{}", low.centroid_mean);
        assert!(low.flatness_mean < 0.1);
        assert_eq!(low.contrast.len(), 7);
        assert_eq!(low.centroid_profile.len(), 20);
    }

    #[test]
    fn test_contrast_bands_cover_spectrum() {
        let config = SongprintConfig::default();
        let freqs: Vec<f32> = (0..1025).map(|k| config.bin_frequency(k)).collect();
        let bands = contrast_bands(&freqs, 6, 200.0);
        assert_eq!(bands.len(), 7);
        assert_eq!(bands[0][0], 0);
        assert_eq!(*bands[6].last().unwrap(), 1024);
    }

    #[test]
    fn test_autocorrelation_profile() {
        let seq: Vec<f32> = (0..50).map(|i| (i as f32 * 0.3).sin()).collect();
        let profile = autocorrelation_profile(&seq, 20);
        assert_relative_eq!(profile[0], 1.0, epsilon = 1e-4);
        assert!(profile.iter().all(|v| v.abs() <= 1.0 + 1e-4));

        assert_eq!(autocorrelation_profile(&[3.0; 10], 20), vec![0.0; 20]);

        let short = autocorrelation_profile(&[1.0, 2.0, 4.0], 20);
        assert_eq!(short.len(), 20);
        assert_eq!(&short[3..], &[0.0; 17]);
    }

    #[test]
    fn test_flat_spectrum_flatness_is_one() {
        assert_relative_eq!(flatness_of([2.0f32; 16].into_iter()), 1.0, epsilon = 1e-6);
    }
}
