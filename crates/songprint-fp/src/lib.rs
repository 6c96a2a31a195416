//! Songprint descriptor record and blob file formats
//!
//! Defines the persisted [`Descriptor`] record, its lightweight
//! [`IndexEntry`] projection, and the three on-disk blob encodings
//! (JSON, BSON and the packed binary `.spd` format).

pub mod blob;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use blob::{load_auto, save, BlobFormat};
pub use descriptor::{descriptor_id, Descriptor, Fingerprint, IndexEntry, MetadataPatch};
pub use error::FormatError;
pub use format::{PackedHeader, HEADER_SIZE, MAGIC, VERSION};
pub use reader::PackedReader;
pub use writer::PackedWriter;
