//! .spd file writer

use crate::blob::write_atomic;
use crate::descriptor::Descriptor;
use crate::error::FormatError;
use crate::format::{PackedHeader, CHECKSUM, HEADER_SIZE};
use std::path::Path;

const ZSTD_LEVEL: i32 = 3;

pub struct PackedWriter {
    compress: bool,
}

impl PackedWriter {
    /// Writer producing zstd-compressed payloads.
    pub fn new() -> Self {
        Self { compress: true }
    }

    pub fn with_compression(compress: bool) -> Self {
        Self { compress }
    }

    /// Encode a descriptor into the full file image (header + payload).
    pub fn encode(&self, descriptor: &Descriptor) -> Result<Vec<u8>, FormatError> {
        let payload = bincode::serialize(descriptor)?;
        let fp = &descriptor.fingerprint;
        let mut header = PackedHeader::new(payload.len() as u64, fp.rows() as u32, fp.cols() as u32);

        let stored = if self.compress {
            let compressed = zstd::encode_all(&payload[..], ZSTD_LEVEL)
                .map_err(|e| FormatError::io("<zstd>", e))?;
            header.set_compressed(true);
            header.payload_size_compressed = compressed.len() as u64;
            compressed
        } else {
            payload
        };
        header.checksum = CHECKSUM.checksum(&stored);

        let mut out = Vec::with_capacity(HEADER_SIZE + stored.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&stored);
        Ok(out)
    }

    /// Write .spd file
    pub fn write(&self, path: &Path, descriptor: &Descriptor) -> Result<(), FormatError> {
        let bytes = self.encode(descriptor)?;
        write_atomic(path, &bytes)
    }
}

impl Default for PackedWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Fingerprint;
    use crate::reader::PackedReader;

    fn descriptor() -> Descriptor {
        Descriptor {
            id: "abc".to_string(),
            file_name: "a.wav".to_string(),
            mel_mean: (0..128).map(|i| i as f32 * -0.5).collect(),
            tempo: None,
            fingerprint: Fingerprint::zeros(64, 10),
            ..Default::default()
        }
    }

    #[test]
    fn test_uncompressed_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.spd");
        PackedWriter::with_compression(false)
            .write(&path, &descriptor())
            .unwrap();

        let header = PackedReader::read_header_from(&path).unwrap();
        assert!(!header.is_compressed());
        assert_eq!((header.fp_rows, header.fp_cols), (64, 10));
        assert_eq!(PackedReader::read(&path).unwrap(), descriptor());
    }

    #[test]
    fn test_corrupted_payload_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.spd");
        let mut bytes = PackedWriter::new().encode(&descriptor()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let err = PackedReader::read(&path).unwrap_err();
        assert!(matches!(err, FormatError::Invalid { .. }), "{err}");
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.spd");
        let mut bytes = PackedWriter::new().encode(&descriptor()).unwrap();
        bytes[0] = b'X';
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            PackedReader::read(&path),
            Err(FormatError::Invalid { .. })
        ));
    }
}
