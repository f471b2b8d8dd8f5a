//! Greedy, order-dependent clustering over a shrinking candidate pool.

use super::{CancellationToken, ClusterConfig, ClusterOutcome, DecodePolicy, DuplicateGroup, SimilarityThreshold};
use crate::core::cache::RasterCache;
use crate::core::raster::{ImageId, Raster};
use crate::core::similarity::{SimilarityScore, SimilarityScorer};
use crate::error::{CompareError, DecodeError, DimensionError};
use crate::events::{null_sender, CompareEvent, CompareProgress, DecodeEvent, Event, EventSender};
use rayon::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Groups near-duplicate images around the first image that claims them.
///
/// Each seed is compared once against every image still in the pool.
/// Candidates scoring strictly above the threshold are removed from the
/// pool and can never join another group.
///
/// # Limitations
///
/// The result is **not** an equivalence-class partition. Similarity is
/// not transitive under this scheme, and a different input order can
/// produce different groups:
///
/// ```text
/// sim(A, B) > t, sim(B, C) > t, sim(A, C) <= t
/// cluster([A, B, C]) -> { A: [B] }   C stays unclustered
/// cluster([B, C, A]) -> { B: [C] }   A stays unclustered
/// ```
pub struct GreedyClusterer {
    cache: Arc<RasterCache>,
    scorer: SimilarityScorer,
    config: ClusterConfig,
    cancellation: CancellationToken,
}

/// How one candidate fared against the current seed
enum Verdict {
    Scored(SimilarityScore),
    Mismatch(DimensionError),
    Undecodable(DecodeError),
}

impl GreedyClusterer {
    pub fn new(cache: Arc<RasterCache>, scorer: SimilarityScorer) -> Self {
        Self {
            cache,
            scorer,
            config: ClusterConfig::default(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Cluster `images` without progress reporting
    pub fn cluster(
        &self,
        images: &[ImageId],
        threshold: SimilarityThreshold,
    ) -> Result<ClusterOutcome, CompareError> {
        self.cluster_with_events(images, threshold, &null_sender())
    }

    /// Cluster `images`, reporting progress after each seed
    pub fn cluster_with_events(
        &self,
        images: &[ImageId],
        threshold: SimilarityThreshold,
        events: &EventSender,
    ) -> Result<ClusterOutcome, CompareError> {
        events.send(Event::Compare(CompareEvent::Started {
            total_images: images.len(),
        }));

        // A path listed twice would otherwise claim itself
        let mut seen = HashSet::with_capacity(images.len());
        let mut pool: VecDeque<ImageId> = VecDeque::with_capacity(images.len());
        for id in images {
            if seen.insert(id) {
                pool.push_back(id.clone());
            } else {
                debug!("ignoring repeated input {}", id);
            }
        }
        let mut outcome = ClusterOutcome::default();
        let mut seeds_processed = 0;

        while let Some(seed) = pool.pop_front() {
            self.check_cancelled()?;
            seeds_processed += 1;
            let started = Instant::now();

            let seed_raster = match self.cache.get(&seed) {
                Ok(raster) => raster,
                Err(error) => {
                    self.exclude(seed, error, &mut outcome, events)?;
                    continue;
                }
            };

            let verdicts = self.judge_pool(&seed, &seed_raster, &pool, started)?;
            self.check_deadline(&seed, started)?;

            let mut members = Vec::new();
            let mut scores = Vec::new();
            let candidates = std::mem::take(&mut pool);

            for (candidate, verdict) in candidates.into_iter().zip(verdicts) {
                match verdict {
                    Verdict::Scored(score) => {
                        outcome.comparisons += 1;
                        if threshold.is_match(score) {
                            members.push(candidate);
                            scores.push(score);
                        } else {
                            pool.push_back(candidate);
                        }
                    }
                    Verdict::Mismatch(error) => {
                        outcome.comparisons += 1;
                        outcome.dimension_mismatches += 1;
                        debug!("{} vs {}: not comparable ({})", seed, candidate, error);
                        pool.push_back(candidate);
                    }
                    Verdict::Undecodable(error) => {
                        self.exclude(candidate, error, &mut outcome, events)?;
                    }
                }
            }

            if !members.is_empty() {
                let group = DuplicateGroup::new(seed, members, scores);
                debug!(
                    "group {} around {} with {} members",
                    group.id,
                    group.representative,
                    group.members.len()
                );
                events.send(Event::Compare(CompareEvent::GroupFound {
                    group_id: group.id.to_string(),
                    representative: group.representative.path().to_path_buf(),
                    member_count: group.members.len(),
                }));
                outcome.groups.push(group);
            }

            events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                seeds_processed,
                pool_remaining: pool.len(),
                comparisons_completed: outcome.comparisons,
                groups_found: outcome.groups.len(),
            })));
        }

        info!(
            "clustered {} images into {} groups ({} comparisons, {} excluded, {} mismatched pairs)",
            images.len(),
            outcome.groups.len(),
            outcome.comparisons,
            outcome.excluded.len(),
            outcome.dimension_mismatches
        );
        events.send(Event::Compare(CompareEvent::Completed {
            total_groups: outcome.groups.len(),
            total_duplicates: outcome.total_duplicates(),
            comparisons: outcome.comparisons,
        }));

        Ok(outcome)
    }

    /// Score every pool entry against the seed, in pool order.
    ///
    /// Nothing is claimed here, so the parallel and sequential paths
    /// return the same verdicts.
    fn judge_pool(
        &self,
        seed: &ImageId,
        seed_raster: &Raster,
        pool: &VecDeque<ImageId>,
        started: Instant,
    ) -> Result<Vec<Verdict>, CompareError> {
        let judge = |candidate: &ImageId| self.judge(seed, seed_raster, candidate, started);

        if self.config.parallel {
            pool.par_iter().map(judge).collect()
        } else {
            pool.iter().map(judge).collect()
        }
    }

    fn judge(
        &self,
        seed: &ImageId,
        seed_raster: &Raster,
        candidate: &ImageId,
        started: Instant,
    ) -> Result<Verdict, CompareError> {
        self.check_cancelled()?;
        self.check_deadline(seed, started)?;

        let candidate_raster = match self.cache.get(candidate) {
            Ok(raster) => raster,
            Err(error) if self.config.decode_policy == DecodePolicy::Abort => {
                return Err(CompareError::Decode(error))
            }
            Err(error) => return Ok(Verdict::Undecodable(error)),
        };

        Ok(match self.scorer.compare(seed_raster, &candidate_raster) {
            Ok(score) => {
                debug!("{} vs {}: {:.4}", seed, candidate, score);
                Verdict::Scored(score)
            }
            Err(error) => Verdict::Mismatch(error),
        })
    }

    fn exclude(
        &self,
        id: ImageId,
        error: DecodeError,
        outcome: &mut ClusterOutcome,
        events: &EventSender,
    ) -> Result<(), CompareError> {
        if self.config.decode_policy == DecodePolicy::Abort {
            return Err(CompareError::Decode(error));
        }

        warn!("excluding {}: {}", id, error);
        events.send(Event::Decode(DecodeEvent::Excluded {
            path: id.path().to_path_buf(),
            message: error.to_string(),
        }));
        outcome.excluded.push((id, error));
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), CompareError> {
        if self.cancellation.is_cancelled() {
            Err(CompareError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn check_deadline(&self, seed: &ImageId, started: Instant) -> Result<(), CompareError> {
        match self.config.seed_deadline {
            Some(deadline) if started.elapsed() > deadline => Err(CompareError::DeadlineExceeded {
                seed: seed.path().to_path_buf(),
                deadline_ms: millis(deadline),
            }),
            _ => Ok(()),
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
