//! Packed `.spd` descriptor file layout
//!
//! ```text
//! offset  size  field
//! 0       4     magic "SPDS"
//! 4       2     version
//! 6       2     flags (bit 0: zstd-compressed payload)
//! 8       8     payload_size (bincode bytes)
//! 16      8     payload_size_compressed (0 if uncompressed)
//! 24      4     fp_rows
//! 28      4     fp_cols
//! 32      8     CRC-64 of the stored payload
//! 40      8     reserved
//! ```
//!
//! All integers are little-endian. The payload follows the header.

use crc::{Crc, CRC_64_ECMA_182};

/// Magic bytes for .spd files: "SPDS"
pub const MAGIC: [u8; 4] = *b"SPDS";

/// Current format version
pub const VERSION: u16 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 48;

const FLAG_COMPRESSED: u16 = 0x1;

pub(crate) const CHECKSUM: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub flags: u16,
    pub payload_size: u64,
    pub payload_size_compressed: u64,
    /// Fingerprint shape, duplicated here so tools can inspect it cheaply
    pub fp_rows: u32,
    pub fp_cols: u32,
    pub checksum: u64,
    pub reserved: u64,
}

impl PackedHeader {
    pub fn new(payload_size: u64, fp_rows: u32, fp_cols: u32) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            flags: 0,
            payload_size,
            payload_size_compressed: 0,
            fp_rows,
            fp_cols,
            checksum: 0,
            reserved: 0,
        }
    }

    pub fn is_compressed(&self) -> bool {
        (self.flags & FLAG_COMPRESSED) != 0
    }

    pub fn set_compressed(&mut self, compressed: bool) {
        if compressed {
            self.flags |= FLAG_COMPRESSED;
        } else {
            self.flags &= !FLAG_COMPRESSED;
        }
    }

    /// Number of payload bytes stored after the header.
    pub fn stored_size(&self) -> u64 {
        if self.is_compressed() {
            self.payload_size_compressed
        } else {
            self.payload_size
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6..8].copy_from_slice(&self.flags.to_le_bytes());
        buf[8..16].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[16..24].copy_from_slice(&self.payload_size_compressed.to_le_bytes());
        buf[24..28].copy_from_slice(&self.fp_rows.to_le_bytes());
        buf[28..32].copy_from_slice(&self.fp_cols.to_le_bytes());
        buf[32..40].copy_from_slice(&self.checksum.to_le_bytes());
        buf[40..48].copy_from_slice(&self.reserved.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Self {
        let u16_at = |o: usize| u16::from_le_bytes([buf[o], buf[o + 1]]);
        let u32_at = |o: usize| {
            let mut b = [0u8; 4];
            b.copy_from_slice(&buf[o..o + 4]);
            u32::from_le_bytes(b)
        };
        let u64_at = |o: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[o..o + 8]);
            u64::from_le_bytes(b)
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buf[0..4]);

        Self {
            magic,
            version: u16_at(4),
            flags: u16_at(6),
            payload_size: u64_at(8),
            payload_size_compressed: u64_at(16),
            fp_rows: u32_at(24),
            fp_cols: u32_at(28),
            checksum: u64_at(32),
            reserved: u64_at(40),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let mut header = PackedHeader::new(1234, 64, 66);
        header.set_compressed(true);
        header.payload_size_compressed = 321;
        header.checksum = 0xDEAD_BEEF_0BAD_F00D;

        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"SPDS");
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 1);
        assert_eq!(PackedHeader::from_bytes(&bytes), header);
        assert_eq!(header.stored_size(), 321);

        header.set_compressed(false);
        assert!(!header.is_compressed());
        assert_eq!(header.stored_size(), 1234);
    }
}
