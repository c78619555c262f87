//! The binned statistics file format.
//!
//! A `.bespin` file is a fixed size header followed by a single zstd
//! compressed block holding the bincode serialized [`BinnedStatistics`]:
//!
//! | bytes | field                                 |
//! |-------|---------------------------------------|
//! | 8     | magic, `BESPIN\0` then a format byte  |
//! | 4     | format version (u32, little-endian)   |
//! | 4     | compressed size of the block          |
//! | 4     | uncompressed size of the block        |
//! | 4     | number of binned fields               |
//! | ...   | compressed block                      |
//!
//! [`BinnedStatistics`]: crate::binned::BinnedStatistics

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub mod reader;
pub mod writer;

pub use reader::{decode_binned, read_binned};
pub use writer::{encode_binned, write_binned};

pub const MAGIC: [u8; 8] = *b"BESPIN\0\x01";
pub const FORMAT_VERSION: u32 = 1;
pub const SUFFIX: &str = "bespin";
pub const HEADER_LEN: usize = MAGIC.len() + 4 * 4;

/// Header of a binned statistics file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u32,
    /// Size of compressed data in bytes
    pub compressed_size: u32,
    /// Size of uncompressed data in bytes
    pub uncompressed_size: u32,
    /// Number of binned fields
    pub n_fields: u32,
}

/// Configuration for writing binned statistics files.
#[derive(Debug, Clone)]
pub struct BlockConfig {
    /// zstd compression level
    pub level: i32,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl FileHeader {
    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&MAGIC)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.compressed_size.to_le_bytes())?;
        writer.write_all(&self.uncompressed_size.to_le_bytes())?;
        writer.write_all(&self.n_fields.to_le_bytes())?;
        Ok(())
    }

    /// Read a header, returning `None` if the magic doesn't match.
    pub(crate) fn read<R: Read>(reader: &mut R) -> io::Result<Option<Self>> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Ok(None);
        }
        let mut buf = [0u8; 4];
        let mut next = || -> io::Result<u32> {
            reader.read_exact(&mut buf)?;
            Ok(u32::from_le_bytes(buf))
        };
        Ok(Some(Self {
            version: next()?,
            compressed_size: next()?,
            uncompressed_size: next()?,
            n_fields: next()?,
        }))
    }
}

/// The path with the `.bespin` suffix appended, unless it already has it.
pub fn with_suffix(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == SUFFIX) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(SUFFIX);
    PathBuf::from(name)
}
