//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the duplicate finder pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Enumeration phase events
    Scan(ScanEvent),
    /// Raster decoding events
    Decode(DecodeEvent),
    /// Clustering phase events
    Compare(CompareEvent),
    /// Deletion events
    Delete(DeleteEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { paths: Vec<PathBuf> },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// An image was found
    ImageFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_images: usize },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories scanned so far
    pub directories_scanned: usize,
    /// Number of images found so far
    pub images_found: usize,
    /// Current directory being scanned
    pub current_path: PathBuf,
}

/// Events raised while decoding rasters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DecodeEvent {
    /// An image could not be decoded and was removed from the candidate pool
    Excluded { path: PathBuf, message: String },
}

/// Events during the clustering phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Clustering has started
    Started { total_images: usize },
    /// Emitted after each seed's scan of the pool
    Progress(CompareProgress),
    /// A duplicate group was emitted
    GroupFound {
        group_id: String,
        representative: PathBuf,
        member_count: usize,
    },
    /// Clustering completed
    Completed {
        total_groups: usize,
        total_duplicates: usize,
        comparisons: usize,
    },
}

/// Progress information during clustering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Seeds taken from the pool so far
    pub seeds_processed: usize,
    /// Images still waiting in the pool
    pub pool_remaining: usize,
    /// Image pairs scored so far
    pub comparisons_completed: usize,
    /// Number of duplicate groups emitted so far
    pub groups_found: usize,
}

/// Events during deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeleteEvent {
    /// Deletion batch has started
    Started { total_files: usize },
    /// A file was removed
    Deleted { path: PathBuf },
    /// A file could not be removed; the batch continues
    Failed { path: PathBuf, message: String },
    /// Deletion batch completed
    Completed { deleted: usize, failed: usize },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled
    Cancelled,
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Comparing,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Total images discovered
    pub total_images: usize,
    /// Number of duplicate groups found
    pub duplicate_groups: usize,
    /// Total number of duplicate images (excluding representatives)
    pub duplicate_count: usize,
    /// Images removed from the pool because they failed to decode
    pub excluded_images: usize,
    /// Potential space savings in bytes
    pub potential_savings_bytes: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
        }
    }
}
