//! Row-wise summary statistics
//!
//! Accumulation happens in f64; rows with (numerically) zero spread have a
//! skewness of 0.

use crate::transform::Matrix;

const ZERO_SPREAD: f64 = 1e-9;

/// Mean, standard deviation and skewness of every matrix row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowStats {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
    pub skew: Vec<f32>,
}

pub fn mean(xs: &[f32]) -> f32 {
    if xs.is_empty() {
        return 0.0;
    }
    (xs.iter().map(|&x| x as f64).sum::<f64>() / xs.len() as f64) as f32
}

/// Population standard deviation.
pub fn std(xs: &[f32]) -> f32 {
    moments(xs).1 as f32
}

pub fn skew(xs: &[f32]) -> f32 {
    moments(xs).2 as f32
}

/// (mean, std, skewness)
fn moments(xs: &[f32]) -> (f64, f64, f64) {
    if xs.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let n = xs.len() as f64;
    let mean = xs.iter().map(|&x| x as f64).sum::<f64>() / n;
    let var = xs.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    if std <= ZERO_SPREAD {
        return (mean, std, 0.0);
    }
    let skew = xs
        .iter()
        .map(|&x| ((x as f64 - mean) / std).powi(3))
        .sum::<f64>()
        / n;
    (mean, std, skew)
}

pub fn row_stats(matrix: &Matrix) -> RowStats {
    let mut stats = RowStats::default();
    for row in matrix {
        let (m, s, k) = moments(row);
        stats.mean.push(m as f32);
        stats.std.push(s as f32);
        stats.skew.push(k as f32);
    }
    stats
}

pub fn row_means(matrix: &Matrix) -> Vec<f32> {
    matrix.iter().map(|row| mean(row)).collect()
}

/// Element-wise average of vectors, clipped to the shortest one.
pub fn average_vectors<'a, I>(vectors: I) -> Vec<f32>
where
    I: IntoIterator<Item = &'a Vec<f32>>,
{
    let vectors: Vec<&Vec<f32>> = vectors.into_iter().collect();
    let len = vectors.iter().map(|v| v.len()).min().unwrap_or(0);
    if len == 0 {
        return Vec::new();
    }
    let n = vectors.len() as f64;
    (0..len)
        .map(|i| (vectors.iter().map(|v| v[i] as f64).sum::<f64>() / n) as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_row_has_zero_skew() {
        let stats = row_stats(&vec![vec![-43.237; 50]]);
        assert_relative_eq!(stats.mean[0], -43.237, epsilon = 1e-4);
        assert!(stats.std[0] < 1e-6);
        assert_eq!(stats.skew[0], 0.0);
    }

    #[test]
    fn test_skew_sign() {
        assert!(skew(&[0.0, 0.0, 0.0, 10.0]) > 0.0);
        assert!(skew(&[0.0, 10.0, 10.0, 10.0]) < 0.0);
        assert_relative_eq!(skew(&[1.0, 2.0, 3.0]), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_population_std() {
        assert_relative_eq!(std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
    }

    #[test]
    fn test_average_vectors_clips() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![3.0, 4.0];
        assert_eq!(average_vectors([&a, &b]), vec![2.0, 3.0]);
        assert!(average_vectors(std::iter::empty::<&Vec<f32>>()).is_empty());
    }
}
