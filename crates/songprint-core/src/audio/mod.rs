//! Audio decoding and resampling
//!
//! Decodes WAV, MP3, FLAC and OGG with dedicated pure Rust decoders and
//! falls back to Symphonia for M4A/AAC and other containers. Every path
//! ends in a mono [`AudioSignal`] at the requested sample rate.

mod container;
mod decoder;
mod resample;

pub use container::decode_container;
pub use decoder::{decode_audio, DecodedAudio};
pub use resample::resample_to_target;

use std::path::Path;

/// File extensions picked up by directory ingestion.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["mp3", "wav", "flac", "ogg", "m4a"];

/// Mono PCM signal at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSignal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,

    // Decoded through Symphonia
    Container,

    Unknown,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("wav") | Some("wave") => AudioFormat::Wav,
            Some("mp3") => AudioFormat::Mp3,
            Some("flac") => AudioFormat::Flac,
            Some("ogg") => AudioFormat::Ogg,
            Some("m4a") | Some("mp4") | Some("aac") | Some("mkv") | Some("webm") => {
                AudioFormat::Container
            }
            _ => AudioFormat::Unknown,
        }
    }
}

/// True if directory ingestion should pick up this file.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection_is_case_insensitive() {
        assert_eq!(AudioFormat::from_path(Path::new("a/B.WAV")), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_path(Path::new("x.m4a")), AudioFormat::Container);
        assert_eq!(AudioFormat::from_path(Path::new("notes.txt")), AudioFormat::Unknown);
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported(Path::new("music/track.flac")));
        assert!(is_supported(Path::new("music/track.M4A")));
        assert!(!is_supported(Path::new("music/track.mkv")));
        assert!(!is_supported(Path::new("music/README")));
    }

    #[test]
    fn test_duration() {
        let signal = AudioSignal::new(vec![0.0; 44100], 22050);
        assert_eq!(signal.duration_seconds(), 2.0);
    }
}
