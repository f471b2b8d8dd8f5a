//! # Core Module
//!
//! The UI-agnostic duplicate detection engine.
//!
//! ## Modules
//! - `raster` - Decoded pixel buffers and the decoders that produce them
//! - `cache` - Memory-budgeted LRU cache of decoded rasters
//! - `similarity` - SSIM scoring, with resize-to-match
//! - `cluster` - Greedy, order-dependent duplicate grouping
//! - `scanner` - Discovers images in directories
//! - `pipeline` - Orchestrates scan and clustering
//! - `cleanup` - Review, unattended selection and deletion

pub mod cache;
pub mod cleanup;
pub mod cluster;
pub mod pipeline;
pub mod raster;
pub mod scanner;
pub mod similarity;

// Re-export commonly used types
pub use cluster::{DuplicateGroup, GreedyClusterer, SimilarityThreshold};
pub use raster::{ImageId, Raster};
pub use scanner::ImageFile;
pub use similarity::{SimilarityScore, SimilarityScorer};
