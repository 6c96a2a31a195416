//! .spd file reader

use crate::descriptor::Descriptor;
use crate::error::FormatError;
use crate::format::{PackedHeader, CHECKSUM, HEADER_SIZE, MAGIC, VERSION};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub struct PackedReader;

impl PackedReader {
    /// Read a packed descriptor, validating magic, version and checksum.
    pub fn read(path: &Path) -> Result<Descriptor, FormatError> {
        let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
        let mut reader = BufReader::new(file);

        let header = Self::read_header(&mut reader, path)?;
        let payload = Self::read_payload(&mut reader, &header, path)?;

        Ok(bincode::deserialize(&payload)?)
    }

    /// Read and validate the header only.
    pub fn read_header_from(path: &Path) -> Result<PackedHeader, FormatError> {
        let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
        Self::read_header(&mut BufReader::new(file), path)
    }

    fn read_header<R: Read>(reader: &mut R, path: &Path) -> Result<PackedHeader, FormatError> {
        let mut buf = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut buf)
            .map_err(|e| FormatError::io(path, e))?;
        let header = PackedHeader::from_bytes(&buf);

        if header.magic != MAGIC {
            return Err(invalid(path, "magic bytes mismatch"));
        }
        if header.version > VERSION {
            return Err(invalid(
                path,
                format!("unsupported version {}", header.version),
            ));
        }
        Ok(header)
    }

    fn read_payload<R: Read>(
        reader: &mut R,
        header: &PackedHeader,
        path: &Path,
    ) -> Result<Vec<u8>, FormatError> {
        let mut stored = Vec::with_capacity(header.stored_size() as usize);
        reader
            .read_to_end(&mut stored)
            .map_err(|e| FormatError::io(path, e))?;
        if stored.len() as u64 != header.stored_size() {
            return Err(invalid(
                path,
                format!(
                    "payload truncated: expected {} bytes, found {}",
                    header.stored_size(),
                    stored.len()
                ),
            ));
        }
        if CHECKSUM.checksum(&stored) != header.checksum {
            return Err(invalid(path, "checksum mismatch"));
        }

        if !header.is_compressed() {
            return Ok(stored);
        }
        let payload = zstd::decode_all(&stored[..]).map_err(|e| FormatError::io(path, e))?;
        if payload.len() as u64 != header.payload_size {
            return Err(invalid(path, "decompressed size mismatch"));
        }
        Ok(payload)
    }
}

fn invalid(path: &Path, reason: impl Into<String>) -> FormatError {
    FormatError::Invalid {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
