//! # Cache Module
//!
//! Keeps decoded rasters in memory so each image is decoded once per run
//! instead of once per comparison.
//!
//! ## Budget
//! Entries are charged `width × height × channels` bytes. When a new
//! raster would push the total over the budget, least-recently-used
//! entries are evicted until it fits. A raster bigger than the whole
//! budget is handed back to the caller without being cached.
//!
//! ## Concurrency
//! `RasterCache::get` takes `&self` and may be called from many threads.
//! Only the bookkeeping sits behind a mutex; decoding runs outside it.
//! Rasters are shared as `Arc<Raster>`, so evicting an entry never
//! invalidates a raster a reader is still using.

mod lru;

pub use lru::RasterCache;

use serde::{Deserialize, Serialize};

/// Default memory budget: 512 MiB
pub const DEFAULT_BUDGET_BYTES: usize = 512 * 1024 * 1024;

/// Cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on the summed size of cached rasters
    pub budget_bytes: usize,
}

impl CacheConfig {
    pub fn with_budget_bytes(budget_bytes: usize) -> Self {
        Self { budget_bytes }
    }

    pub fn with_budget_megabytes(megabytes: usize) -> Self {
        Self::with_budget_bytes(megabytes.saturating_mul(1024 * 1024))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::with_budget_bytes(DEFAULT_BUDGET_BYTES)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups served from memory
    pub hits: usize,
    /// Lookups that had to decode
    pub misses: usize,
    /// Entries dropped to make room
    pub evictions: usize,
    /// Rasters returned without caching because they exceed the budget
    pub oversized: usize,
    /// Entries currently cached
    pub entries: usize,
    /// Bytes currently charged against the budget
    pub used_bytes: usize,
    /// Configured budget
    pub budget_bytes: usize,
}
