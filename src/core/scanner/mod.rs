//! # Scanner Module
//!
//! Discovers image files in directories and turns them into the ordered
//! `ImageId` sequence the clustering engine consumes.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - WebP, GIF, BMP, TIFF when their extensions are enabled
//!
//! Only `jpg`, `jpeg` and `png` are scanned by default.
//!
//! ## Order
//! Directory entries are visited sorted by file name, and roots in the
//! order given. Grouping depends on this order, so it is kept stable.
//!
//! ## Example
//! ```rust,ignore
//! use similar_image_finder::core::scanner::{ImageScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default().recursive(true));
//! let result = scanner.scan(&["/home/me/Pictures".into()])?;
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ScanConfig, WalkDirScanner, DEFAULT_EXTENSIONS};

use crate::core::raster::ImageId;
use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A discovered image file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFile {
    /// Identifier handed to the clustering engine
    pub id: ImageId,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
    /// Format implied by the extension
    pub format: ImageFormat,
}

impl ImageFile {
    pub fn path(&self) -> &Path {
        self.id.path()
    }
}

/// Image formats recognised by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "webp" => ImageFormat::WebP,
            "gif" => ImageFormat::Gif,
            "bmp" => ImageFormat::Bmp,
            "tiff" | "tif" => ImageFormat::Tiff,
            _ => ImageFormat::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(ImageFormat::from_extension)
            .unwrap_or(ImageFormat::Unknown)
    }

    /// Check if this format can be decoded
    pub fn is_supported(&self) -> bool {
        !matches!(self, ImageFormat::Unknown)
    }
}

/// Result of a scan operation
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Discovered images, in discovery order
    pub images: Vec<ImageFile>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

impl ScanResult {
    /// The ordered id sequence for clustering
    pub fn ids(&self) -> Vec<ImageId> {
        self.images.iter().map(|image| image.id.clone()).collect()
    }
}

/// Trait for image scanners
///
/// Implement this trait to feed the pipeline from somewhere other than
/// the local filesystem (e.g., in tests).
pub trait ImageScanner: Send + Sync {
    /// Scan directories and return discovered images
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError>;

    /// Scan with progress reporting via events
    fn scan_with_events(&self, paths: &[PathBuf], events: &EventSender) -> Result<ScanResult, ScanError>;
}
