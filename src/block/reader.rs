/// block/reader.rs
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use super::{with_suffix, FileHeader, FORMAT_VERSION, HEADER_LEN};
use crate::binned::BinnedStatistics;
use crate::error::{BespinError, Result};

const MAX_PREALLOC: usize = 64 * 1024 * 1024;

/// Decode the full contents of a binned statistics file. `path` is only
/// used for error messages.
pub fn decode_binned(bytes: &[u8], path: &Path) -> Result<BinnedStatistics> {
    let invalid = |reason: &str| BespinError::InvalidFormat {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    if bytes.len() < HEADER_LEN {
        return Err(invalid("file too short"));
    }

    let mut cursor = Cursor::new(bytes);
    let header = FileHeader::read(&mut cursor)?.ok_or_else(|| invalid("not a bespin file"))?;
    if header.version != FORMAT_VERSION {
        return Err(invalid(&format!(
            "unsupported format version {} (expected {})",
            header.version, FORMAT_VERSION
        )));
    }
    let data = &bytes[HEADER_LEN..];
    if data.len() != header.compressed_size as usize {
        return Err(invalid(&format!(
            "expected {} bytes of data, found {}",
            header.compressed_size,
            data.len()
        )));
    }

    // The header size is only a hint, so don't trust it for the allocation
    let capacity = (header.uncompressed_size as usize).min(MAX_PREALLOC);
    let mut decompressed = Vec::with_capacity(capacity);
    zstd::stream::copy_decode(data, &mut decompressed)
        .map_err(|e| invalid(&format!("decompression failed: {}", e)))?;
    if decompressed.len() != header.uncompressed_size as usize {
        return Err(invalid(&format!(
            "expected {} bytes once decompressed, found {}",
            header.uncompressed_size,
            decompressed.len()
        )));
    }
    let binned: BinnedStatistics = bincode::deserialize(&decompressed)
        .map_err(|e| invalid(&format!("corrupt data: {}", e)))?;
    if binned.n_fields() != header.n_fields as usize {
        return Err(invalid("field count does not match header"));
    }
    binned.validate().map_err(|e| invalid(&e.to_string()))?;
    Ok(binned)
}

/// Read binned statistics from `path`, or `path` with the `.bespin` suffix.
pub fn read_binned(path: &Path) -> Result<BinnedStatistics> {
    let path = if path.exists() {
        path.to_path_buf()
    } else {
        with_suffix(path)
    };
    if !path.exists() {
        return Err(BespinError::FileNotFound(path));
    }

    let file = File::open(&path)?;
    if (file.metadata()?.len() as usize) < HEADER_LEN {
        return Err(BespinError::InvalidFormat {
            path,
            reason: "file too short".to_string(),
        });
    }
    // SAFETY: the file is only read, and is not expected to change while
    // it is mapped.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    decode_binned(&mmap[..], &path)
}
