//! Analysis segmentation
//!
//! Long signals are analysed through evenly placed windows (head, middle
//! and tail with the default three segments), each capped at
//! `segment_max_seconds`. Signals too short to give every segment at least
//! `n_fft` samples are analysed whole; signals shorter than `n_fft` are
//! zero-padded.

use crate::config::SongprintConfig;

/// One analysis window of the input signal
#[derive(Debug, Clone)]
pub struct AudioSegment {
    /// Segment identifier (0-based)
    pub segment_id: usize,
    /// First sample of the window in the original signal
    pub start_sample: usize,
    /// Audio samples for this segment
    pub samples: Vec<f32>,
}

/// Length of each segment for a signal of `len` samples.
fn segment_length(len: usize, config: &SongprintConfig) -> usize {
    let cap = (config.segment_max_seconds * config.sample_rate as f32) as usize;
    (len / config.max_segments).min(cap)
}

/// Split `samples` into analysis segments.
pub fn segment_audio(samples: &[f32], config: &SongprintConfig) -> Vec<AudioSegment> {
    let len = samples.len();

    if len < config.n_fft {
        log::warn!(
            "Signal of {} samples is shorter than n_fft ({}), zero-padding",
            len,
            config.n_fft
        );
        let mut padded = samples.to_vec();
        padded.resize(config.n_fft, 0.0);
        return vec![AudioSegment {
            segment_id: 0,
            start_sample: 0,
            samples: padded,
        }];
    }

    let seg_len = segment_length(len, config);
    if config.max_segments == 1 || seg_len < config.n_fft {
        return vec![AudioSegment {
            segment_id: 0,
            start_sample: 0,
            samples: samples.to_vec(),
        }];
    }

    let n = config.max_segments;
    let span = len - seg_len;
    (0..n)
        .map(|i| {
            let start = span * i / (n - 1);
            AudioSegment {
                segment_id: i,
                start_sample: start,
                samples: samples[start..start + seg_len].to_vec(),
            }
        })
        .collect()
}
