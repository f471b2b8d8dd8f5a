//! Reads image files, memory-mapping the large ones.

use crate::error::DecodeError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read the whole file, memory-mapped if it is at least 1MB.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, DecodeError> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;

    if !metadata.is_file() {
        return Err(DecodeError::InvalidImage {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }

    if metadata.len() == 0 {
        return Err(DecodeError::EmptyImage {
            path: path.to_path_buf(),
        });
    }

    if metadata.len() >= MMAP_THRESHOLD {
        read_mmap(path)
    } else {
        let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
        Ok(FileBytes::Vec(bytes))
    }
}

fn read_mmap(path: &Path) -> Result<FileBytes, DecodeError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;

    // SAFETY: the map is read-only and owns the file handle for its lifetime.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| io_error(path, e))?;

    Ok(FileBytes::Mmap(mmap))
}

fn io_error(path: &Path, source: std::io::Error) -> DecodeError {
    if source.kind() == std::io::ErrorKind::NotFound {
        DecodeError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        DecodeError::IoError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    Vec(Vec<u8>),
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}
