//! Sample rate conversion by linear interpolation

use anyhow::Result;

/// Resample audio to target sample rate using linear interpolation
pub fn resample_to_target(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        anyhow::bail!("Sample rates must be > 0 ({} -> {})", from_rate, to_rate);
    }
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).round() as usize;
    let last = samples.len().saturating_sub(1);

    let output = (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let src_idx = (src_pos.floor() as usize).min(last);
            let frac = (src_pos - src_idx as f64) as f32;
            match samples.get(src_idx + 1) {
                Some(&next) => samples[src_idx] * (1.0 - frac) + next * frac,
                None => samples[src_idx],
            }
        })
        .collect();

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_to_target(&samples, 8000, 8000).unwrap(), samples);
    }

    #[test]
    fn test_downsample_halves_length() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let out = resample_to_target(&samples, 44100, 22050).unwrap();
        assert_eq!(out.len(), 50);
        assert_eq!(out[10], 20.0);
    }

    #[test]
    fn test_upsample_interpolates() {
        let out = resample_to_target(&[0.0, 1.0], 1, 2).unwrap();
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_zero_rate_is_an_error() {
        assert!(resample_to_target(&[0.0], 0, 22050).is_err());
    }
}
