//! # Similar Image Finder
//!
//! Finds near-duplicate images by structural similarity (SSIM) and groups
//! them for review.
//!
//! ## Grouping is greedy
//! Images are grouped around the first image that claims them, in
//! discovery order. Similarity is not treated as transitive: if A is like
//! B and B is like C, A and C may still land in different groups, and
//! reordering the input can change the result. See
//! [`core::cluster::GreedyClusterer`].
//!
//! ## Architecture
//! The library is split into a core engine and thin outer layers:
//! - `core` - decoding, caching, similarity, clustering, scanning, cleanup
//! - `events` - Event-driven progress reporting
//! - `error` - Typed errors with paths and reasons
//!
//! The `img-dedup` binary adds the command-line interface on top.

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DuplicateFinderError, Result};

/// Initialize tracing for the library
///
/// Logs go to stderr so they never mix with JSON on stdout. `RUST_LOG`
/// wins when set; otherwise the level is `debug` when `verbose` and
/// `info` when not. Calling it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
