//! Pipeline execution implementation.

use crate::core::cache::{CacheConfig, CacheStats, RasterCache};
use crate::core::cluster::{
    CancellationToken, ClusterConfig, DecodePolicy, DuplicateGroup, GreedyClusterer, SimilarityThreshold,
};
use crate::core::raster::{ColorMode, FileDecoder, ImageId, RasterDecoder};
use crate::core::scanner::{ImageScanner, ScanConfig, WalkDirScanner};
use crate::core::similarity::SimilarityScorer;
use crate::error::{CompareError, DecodeError, DuplicateFinderError};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelinePhase, PipelineSummary};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// Duplicate groups, in the order their seeds were processed
    pub groups: Vec<DuplicateGroup>,
    /// Total images discovered
    pub total_images: usize,
    /// Images dropped because they could not be decoded
    pub excluded: Vec<(ImageId, DecodeError)>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<String>,
    /// Raster cache counters at the end of the run
    pub cache_stats: CacheStats,
    /// Image pairs scored
    pub comparisons: usize,
    /// Pairs skipped because their channel layouts differ
    pub dimension_mismatches: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Number of duplicate images (excluding representatives)
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Bytes freed if every member of every group were deleted
    pub fn potential_savings_bytes(&self) -> u64 {
        self.groups.iter().map(|g| g.duplicate_size_bytes).sum()
    }

    fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            total_images: self.total_images,
            duplicate_groups: self.groups.len(),
            duplicate_count: self.duplicate_count(),
            excluded_images: self.excluded.len(),
            potential_savings_bytes: self.potential_savings_bytes(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directories to scan
    pub paths: Vec<PathBuf>,
    /// Scores must exceed this to group (strictly between 0 and 1)
    pub threshold: f64,
    /// Scanner configuration
    pub scan_config: ScanConfig,
    /// Raster cache budget
    pub cache: CacheConfig,
    /// Channel layout of decoded rasters
    pub color_mode: ColorMode,
    /// Clustering engine settings
    pub cluster: ClusterConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            threshold: SimilarityThreshold::default().value(),
            scan_config: ScanConfig::default(),
            cache: CacheConfig::default(),
            color_mode: ColorMode::default(),
            cluster: ClusterConfig::default(),
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    decoder: Option<Arc<dyn RasterDecoder>>,
    cancellation: CancellationToken,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            decoder: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Add directories to scan
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    /// Set the similarity threshold; validated by `build`
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Descend into subdirectories
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.scan_config.recursive = recursive;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.config.cache = config;
        self
    }

    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.config.color_mode = mode;
        self
    }

    pub fn decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.config.cluster.decode_policy = policy;
        self
    }

    /// Score candidates on the rayon pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.cluster.parallel = parallel;
        self
    }

    pub fn seed_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.config.cluster.seed_deadline = deadline;
        self
    }

    /// Share a cancellation flag with the caller
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Replace the file decoder, e.g. with an in-memory one
    pub fn decoder(mut self, decoder: Arc<dyn RasterDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Build the pipeline, rejecting a threshold outside (0, 1)
    pub fn build(self) -> Result<Pipeline, DuplicateFinderError> {
        let threshold = SimilarityThreshold::new(self.config.threshold)?;
        let decoder = self
            .decoder
            .unwrap_or_else(|| Arc::new(FileDecoder::new(self.config.color_mode)));

        Ok(Pipeline {
            config: self.config,
            threshold,
            decoder,
            cancellation: self.cancellation,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The duplicate detection pipeline
pub struct Pipeline {
    config: PipelineConfig,
    threshold: SimilarityThreshold,
    decoder: Arc<dyn RasterDecoder>,
    cancellation: CancellationToken,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn threshold(&self) -> SimilarityThreshold {
        self.threshold
    }

    /// Handle for cancelling a run from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, DuplicateFinderError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<PipelineResult, DuplicateFinderError> {
        let start_time = Instant::now();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let scanner = WalkDirScanner::new(self.config.scan_config.clone());
        let scan_result = scanner.scan_with_events(&self.config.paths, events)?;

        let errors: Vec<String> = scan_result.errors.iter().map(ToString::to_string).collect();
        let ids = scan_result.ids();
        let sizes: HashMap<&ImageId, u64> = scan_result
            .images
            .iter()
            .map(|image| (&image.id, image.size))
            .collect();

        info!(
            "found {} images in {} location(s)",
            ids.len(),
            self.config.paths.len()
        );

        // Phase 2: Clustering
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Comparing,
        }));

        let cache = Arc::new(RasterCache::new(Arc::clone(&self.decoder), self.config.cache));
        let clusterer = GreedyClusterer::new(Arc::clone(&cache), SimilarityScorer::ssim())
            .with_config(self.config.cluster.clone())
            .with_cancellation(self.cancellation.clone());

        let outcome = match clusterer.cluster_with_events(&ids, self.threshold, events) {
            Ok(outcome) => outcome,
            Err(CompareError::Cancelled) => {
                events.send(Event::Pipeline(PipelineEvent::Cancelled));
                return Err(CompareError::Cancelled.into());
            }
            Err(e) => {
                events.send(Event::Pipeline(PipelineEvent::Error {
                    message: e.to_string(),
                }));
                return Err(e.into());
            }
        };

        // Phase 3: Sizes
        let mut groups = outcome.groups;
        for group in &mut groups {
            group.duplicate_size_bytes = group
                .members
                .iter()
                .filter_map(|member| sizes.get(member))
                .sum();
        }

        let result = PipelineResult {
            groups,
            total_images: ids.len(),
            excluded: outcome.excluded,
            errors,
            cache_stats: cache.stats(),
            comparisons: outcome.comparisons,
            dimension_mismatches: outcome.dimension_mismatches,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: result.summary(),
        }));

        Ok(result)
    }
}
