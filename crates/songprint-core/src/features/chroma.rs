//! Constant-Q chromagram

use crate::transform::{ConstantQPooling, Matrix, Spectrogram};

/// Fold constant-Q bands across octaves and max-normalize each frame.
pub fn chromagram(spec: &Spectrogram, pooling: &ConstantQPooling) -> Matrix {
    let bands = pooling.apply(spec);
    let n_chroma = pooling.bins_per_octave();
    let mut chroma = vec![vec![0.0f32; spec.num_frames]; n_chroma];

    for (k, band) in bands.iter().enumerate() {
        for (acc, v) in chroma[k % n_chroma].iter_mut().zip(band) {
            *acc += v;
        }
    }

    for t in 0..spec.num_frames {
        let peak = chroma.iter().map(|row| row[t]).fold(0.0f32, f32::max);
        if peak > 0.0 {
            chroma.iter_mut().for_each(|row| row[t] /= peak);
        }
    }
    chroma
}

/// Sum 3-per-semitone chroma (or any multiple of 12) into 12 pitch classes.
///
/// Band `k` is centred `k / bins_per_semitone` semitones above C, so the
/// neighbours on both sides of each centre fold into the same class.
pub fn pitch_classes(chroma: &Matrix) -> Matrix {
    let n = chroma.len();
    let frames = chroma.first().map_or(0, Vec::len);
    let per_semitone = (n / 12).max(1);
    let mut classes = vec![vec![0.0f32; frames]; 12];
    for (k, row) in chroma.iter().enumerate() {
        let pc = ((k + per_semitone / 2) / per_semitone) % 12;
        for (acc, v) in classes[pc].iter_mut().zip(row) {
            *acc += v;
        }
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SongprintConfig;
    use crate::transform::Stft;
    use std::f32::consts::PI;

    #[test]
    fn test_a440_lights_up_pitch_class_a() {
        let config = SongprintConfig::default();
        let samples: Vec<f32> = (0..22050)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 22050.0).sin())
            .collect();
        let spec = Stft::new(&config).power(&samples);
        let chroma = chromagram(&spec, &ConstantQPooling::new(&config));
        assert_eq!(chroma.len(), 36);

        let classes = pitch_classes(&chroma);
        let t = spec.num_frames / 2;
        let best = (0..12)
            .max_by(|&a, &b| classes[a][t].total_cmp(&classes[b][t]))
            .unwrap();
        assert_eq!(best, 9, "A is pitch class 9");

        let peak = chroma.iter().map(|row| row[t]).fold(0.0f32, f32::max);
        assert!((peak - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_class_folding() {
        let mut chroma = vec![vec![0.0]; 36];
        chroma[35][0] = 1.0;
        chroma[1][0] = 2.0;
        chroma[4][0] = 4.0;
        let classes = pitch_classes(&chroma);
        assert_eq!(classes[0][0], 3.0);
        assert_eq!(classes[1][0], 4.0);
    }
}
