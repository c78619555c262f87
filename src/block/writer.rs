/// block/writer.rs
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{with_suffix, BlockConfig, FileHeader, FORMAT_VERSION};
use crate::binned::BinnedStatistics;
use crate::error::{BespinError, Result};

fn size_u32(size: usize) -> Result<u32> {
    u32::try_from(size).map_err(|_| {
        BespinError::StringError(format!("binned statistics too large to write ({} bytes)", size))
    })
}

/// Serialize and compress binned statistics into the full file contents.
pub fn encode_binned(binned: &BinnedStatistics, config: &BlockConfig) -> Result<Vec<u8>> {
    let serialized = bincode::serialize(binned)?;

    let mut compressed = Vec::new();
    zstd::stream::copy_encode(serialized.as_slice(), &mut compressed, config.level)?;

    let header = FileHeader {
        version: FORMAT_VERSION,
        compressed_size: size_u32(compressed.len())?,
        uncompressed_size: size_u32(serialized.len())?,
        n_fields: size_u32(binned.n_fields())?,
    };
    let mut bytes = Vec::with_capacity(super::HEADER_LEN + compressed.len());
    header.write(&mut bytes)?;
    bytes.extend_from_slice(&compressed);
    Ok(bytes)
}

/// Write binned statistics to `path` (with the `.bespin` suffix added if
/// needed), returning the path written.
pub fn write_binned(
    binned: &BinnedStatistics,
    path: &Path,
    overwrite: bool,
    config: &BlockConfig,
) -> Result<PathBuf> {
    let path = with_suffix(path);
    if path.exists() && !overwrite {
        return Err(BespinError::FileExists(path));
    }

    let bytes = encode_binned(binned, config)?;
    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}
