//! # Error Module
//!
//! Error types for the similar image finder.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Separate fatal from per-item** - a broken image or a failed delete
//!   is reported for that item, it does not end the run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DuplicateFinderError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Deletion error: {0}")]
    Delete(#[from] DeleteError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Interactive prompt failed: {0}")]
    Prompt(String),

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that occur while enumerating image files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while turning an image file into a raster
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Image not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    InvalidImage { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },
}

impl DecodeError {
    /// Path of the image that failed to decode
    pub fn path(&self) -> &PathBuf {
        match self {
            DecodeError::NotFound { path }
            | DecodeError::IoError { path, .. }
            | DecodeError::InvalidImage { path, .. }
            | DecodeError::EmptyImage { path } => path,
        }
    }
}

/// Two rasters cannot be brought to a common shape.
///
/// Never fatal during clustering: the pair is simply not a duplicate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DimensionError {
    #[error("Channel count mismatch: reference has {reference}, other has {other}")]
    ChannelMismatch { reference: u8, other: u8 },

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },

    #[error("Unsupported channel count: {channels}")]
    UnsupportedChannels { channels: u8 },

    #[error("Raster has zero width or height")]
    Empty,

    #[error("Resize failed: {0}")]
    ResizeFailed(String),
}

/// Errors that end a clustering run
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Invalid threshold: {value} (must be strictly between 0 and 1)")]
    InvalidThreshold { value: f64 },

    #[error("Comparison was cancelled")]
    Cancelled,

    #[error("Scan for seed {seed} exceeded its deadline of {deadline_ms} ms")]
    DeadlineExceeded { seed: PathBuf, deadline_ms: u64 },

    #[error("Aborted on undecodable image: {0}")]
    Decode(#[from] DecodeError),
}

/// Errors that occur when removing a single file
#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("File already missing: {path}")]
    AlreadyMissing { path: PathBuf },

    #[error("Permission denied deleting: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to delete {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write deletion report to {path}: {reason}")]
    Report { path: PathBuf, reason: String },
}

impl DeleteError {
    /// Classify an I/O error raised while removing `path`
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => DeleteError::AlreadyMissing { path },
            std::io::ErrorKind::PermissionDenied => DeleteError::PermissionDenied { path },
            _ => DeleteError::Io { path, source },
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DuplicateFinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_includes_path() {
        let error = ScanError::DirectoryNotFound {
            path: PathBuf::from("/photos/vacation"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/vacation"));
    }

    #[test]
    fn decode_error_includes_path_and_reason() {
        let error = DecodeError::InvalidImage {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("invalid JPEG"));
        assert_eq!(error.path(), &PathBuf::from("/photos/broken.jpg"));
    }

    #[test]
    fn threshold_error_names_the_interval() {
        let error = CompareError::InvalidThreshold { value: 1.5 };
        let message = error.to_string();
        assert!(message.contains("1.5"));
        assert!(message.contains("between 0 and 1"));
    }

    #[test]
    fn delete_error_classifies_io_kinds() {
        let missing = DeleteError::from_io(
            PathBuf::from("/a.jpg"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(missing, DeleteError::AlreadyMissing { .. }));

        let denied = DeleteError::from_io(
            PathBuf::from("/b.jpg"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(denied, DeleteError::PermissionDenied { .. }));

        let other = DeleteError::from_io(
            PathBuf::from("/c.jpg"),
            std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
        );
        assert!(other.to_string().contains("disk on fire"));
    }
}
