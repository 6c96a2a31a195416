//! Rhythm descriptors: zero crossings, RMS, onset strength, tempo and beats
//!
//! Tempo comes from the onset autocorrelation weighted by a log-normal
//! prior; beats from dynamic-programming tracking (Ellis, 2007).

use super::stats;
use crate::config::SongprintConfig;
use crate::transform::{Matrix, Stft};

/// Transition cost tightness of the beat tracker
const TIGHTNESS: f32 = 100.0;
/// Width (octaves) of the tempo prior
const PRIOR_STD_OCTAVES: f32 = 1.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RhythmFeatures {
    pub zero_crossing_rate_mean: f32,
    pub rms_mean: f32,
    /// None when the onset envelope carries no energy
    pub tempo: Option<f32>,
    /// Standard deviation of beat intervals in seconds
    pub beat_std: Option<f32>,
    pub pulse_clarity: f32,
}

pub struct RhythmAnalyzer {
    frames_per_second: f32,
    min_bpm: f32,
    max_bpm: f32,
    start_bpm: f32,
}

impl RhythmAnalyzer {
    pub fn new(config: &SongprintConfig) -> Self {
        Self {
            frames_per_second: config.sample_rate as f32 / config.hop_length as f32,
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
            start_bpm: config.start_bpm,
        }
    }

    pub fn analyze(&self, samples: &[f32], stft: &Stft, mel_db: &Matrix) -> RhythmFeatures {
        let mut zcr = Vec::new();
        let mut rms = Vec::new();
        for frame in stft.frames(samples) {
            zcr.push(zero_crossing_rate(&frame));
            rms.push(root_mean_square(&frame));
        }

        let onset = onset_strength(mel_db);
        let tempo = self.estimate_tempo(&onset);
        let beat_std = tempo.map(|bpm| {
            let beats = self.track_beats(&onset, bpm);
            let intervals: Vec<f32> = beats
                .windows(2)
                .map(|w| (w[1] - w[0]) as f32 / self.frames_per_second)
                .collect();
            stats::std(&intervals)
        });

        RhythmFeatures {
            zero_crossing_rate_mean: stats::mean(&zcr),
            rms_mean: stats::mean(&rms),
            tempo,
            beat_std,
            pulse_clarity: stats::mean(&onset),
        }
    }

    fn lag_to_bpm(&self, lag: usize) -> f32 {
        60.0 * self.frames_per_second / lag as f32
    }

    /// Tempo (BPM) maximizing the prior-weighted onset autocorrelation.
    pub fn estimate_tempo(&self, onset: &[f32]) -> Option<f32> {
        let n = onset.len();
        if n < 2 || onset.iter().all(|&v| v <= 0.0) {
            return None;
        }

        let min_lag = (60.0 * self.frames_per_second / self.max_bpm).ceil().max(1.0) as usize;
        let max_lag = ((60.0 * self.frames_per_second / self.min_bpm).floor() as usize).min(n - 1);
        let log_start = self.start_bpm.log2();

        (min_lag..=max_lag)
            .filter_map(|lag| {
                let ac: f32 = onset.iter().zip(&onset[lag..]).map(|(a, b)| a * b).sum();
                let bpm = self.lag_to_bpm(lag);
                let prior = (-0.5 * ((bpm.log2() - log_start) / PRIOR_STD_OCTAVES).powi(2)).exp();
                let score = ac * prior;
                (score > 0.0).then_some((bpm, score))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(bpm, _)| bpm)
    }

    /// Beat frame indices for the given tempo.
    pub fn track_beats(&self, onset: &[f32], bpm: f32) -> Vec<usize> {
        let n = onset.len();
        let period = (60.0 * self.frames_per_second / bpm).round().max(1.0);
        let p = period as usize;
        if n == 0 {
            return Vec::new();
        }

        let std = stats::std(onset);
        let norm: Vec<f32> = if std > 0.0 {
            onset.iter().map(|v| v / std).collect()
        } else {
            onset.to_vec()
        };
        let local = local_score(&norm, p);
        let local_max = local.iter().copied().fold(0.0f32, f32::max);

        let mut cumscore = vec![0.0f32; n];
        let mut backlink: Vec<Option<usize>> = vec![None; n];
        let mut started = false;

        for t in 0..n {
            let lo = t.saturating_sub(2 * p);
            let hi = t.saturating_sub((p / 2).max(1));
            let best = (lo..=hi)
                .filter(|&prev| prev < t)
                .map(|prev| {
                    let ratio = (t - prev) as f32 / period;
                    let cost = -TIGHTNESS * ratio.ln().powi(2);
                    (prev, cumscore[prev] + cost)
                })
                .max_by(|a, b| a.1.total_cmp(&b.1));

            if !started && local[t] < 0.01 * local_max {
                cumscore[t] = local[t];
                continue;
            }
            started = true;
            match best {
                Some((prev, score)) => {
                    cumscore[t] = local[t] + score;
                    backlink[t] = Some(prev);
                }
                None => cumscore[t] = local[t],
            }
        }

        let Some(last) = last_beat(&cumscore) else {
            return Vec::new();
        };
        let mut beats = vec![last];
        let mut cursor = last;
        while let Some(prev) = backlink[cursor] {
            beats.push(prev);
            cursor = prev;
        }
        beats.reverse();
        beats
    }
}

/// Onset envelope convolved with a Gaussian of width proportional to the period.
fn local_score(onset: &[f32], period: usize) -> Vec<f32> {
    let p = period as isize;
    let window: Vec<f32> = (-p..=p)
        .map(|i| (-0.5 * (i as f32 * 32.0 / period as f32).powi(2)).exp())
        .collect();
    let n = onset.len() as isize;
    (0..n)
        .map(|t| {
            window
                .iter()
                .enumerate()
                .filter_map(|(w, weight)| {
                    let idx = t + w as isize - p;
                    (0..n).contains(&idx).then(|| weight * onset[idx as usize])
                })
                .sum()
        })
        .collect()
}

/// Last local maximum of the cumulative score above half the median maximum.
fn last_beat(cumscore: &[f32]) -> Option<usize> {
    let n = cumscore.len();
    let maxima: Vec<usize> = (0..n)
        .filter(|&t| {
            let left = t == 0 || cumscore[t] > cumscore[t - 1];
            let right = t + 1 == n || cumscore[t] >= cumscore[t + 1];
            left && right
        })
        .collect();
    if maxima.is_empty() {
        return None;
    }
    let mut values: Vec<f32> = maxima.iter().map(|&t| cumscore[t]).collect();
    values.sort_by(f32::total_cmp);
    let median = values[values.len() / 2];
    maxima
        .iter()
        .rev()
        .find(|&&t| cumscore[t] >= 0.5 * median)
        .copied()
}

/// Mean over mel bands of the positive first difference in time.
pub fn onset_strength(mel_db: &Matrix) -> Vec<f32> {
    let frames = mel_db.first().map_or(0, Vec::len);
    let bands = mel_db.len().max(1) as f32;
    let mut onset = vec![0.0f32; frames];
    for row in mel_db {
        for t in 1..frames {
            onset[t] += (row[t] - row[t - 1]).max(0.0);
        }
    }
    onset.iter_mut().for_each(|v| *v /= bands);
    onset
}

fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / frame.len() as f32
}

fn root_mean_square(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|x| x * x).sum::<f32>() / frame.len() as f32).sqrt()
}
