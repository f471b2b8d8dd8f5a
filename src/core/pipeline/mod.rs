//! # Pipeline Module
//!
//! Orchestrates the full duplicate detection workflow.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Discover images in the given directories, in a stable order
//! 2. **Decode** - Rasters are decoded lazily through a memory-bounded cache
//! 3. **Cluster** - Greedy grouping by structural similarity
//! 4. **Size** - Fill in how many bytes each group's duplicates occupy
//!
//! ## Parallelism
//! With `parallel(true)`, each seed's candidates are scored on the rayon
//! pool. Groups are identical to a sequential run.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
