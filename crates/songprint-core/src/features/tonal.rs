//! Tonal centroid (tonnetz) features

use super::chroma::pitch_classes;
use crate::transform::Matrix;
use std::f32::consts::PI;

/// (angle step per pitch class, radius) for fifths, minor thirds, major thirds
const INTERVALS: [(f32, f32); 3] = [(7.0 * PI / 6.0, 1.0), (3.0 * PI / 2.0, 1.0), (2.0 * PI / 3.0, 0.5)];

/// Project L1-normalized pitch-class chroma onto the 6-D tonal space.
///
/// Returns `[6][frames]`: sin/cos pairs for fifths, minor thirds and
/// major thirds.
pub fn tonnetz(chroma: &Matrix) -> Matrix {
    let classes = pitch_classes(chroma);
    let frames = classes.first().map_or(0, Vec::len);

    let basis: Vec<[f32; 12]> = INTERVALS
        .iter()
        .flat_map(|&(step, radius)| {
            let mut sin = [0.0f32; 12];
            let mut cos = [0.0f32; 12];
            for k in 0..12 {
                let angle = k as f32 * step;
                sin[k] = radius * angle.sin();
                cos[k] = radius * angle.cos();
            }
            [sin, cos]
        })
        .collect();

    let mut out = vec![vec![0.0f32; frames]; basis.len()];
    for t in 0..frames {
        let total: f32 = classes.iter().map(|row| row[t].abs()).sum();
        if total <= 0.0 {
            continue;
        }
        for (dim, weights) in basis.iter().enumerate() {
            out[dim][t] = weights
                .iter()
                .zip(&classes)
                .map(|(w, row)| w * row[t] / total)
                .sum();
        }
    }
    out
}
