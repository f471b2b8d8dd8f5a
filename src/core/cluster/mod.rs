//! # Cluster Module
//!
//! Partitions an ordered image list into duplicate groups.
//!
//! ## How It Works
//! 1. Put every image into a candidate pool, in discovery order
//! 2. Take the first image as the seed
//! 3. Score every remaining candidate against the seed once
//! 4. Candidates scoring above the threshold leave the pool and join the
//!    seed's group
//! 5. Repeat until the pool is empty
//!
//! ## Limitations
//! Grouping is greedy and **not transitive**. If A matches B and B
//! matches C but A does not match C, then `[A, B, C]` yields `{A: [B]}`
//! while `[B, C, A]` yields `{B: [C]}`. Reordering the input can change
//! the groups. This keeps the comparison count at O(n²) and every image
//! is claimed at most once.

mod cancel;
mod greedy;
mod threshold;

pub use cancel::CancellationToken;
pub use greedy::GreedyClusterer;
pub use threshold::SimilarityThreshold;

use crate::core::raster::ImageId;
use crate::core::similarity::SimilarityScore;
use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A seed and the candidates it claimed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Unique identifier for this group
    pub id: Uuid,
    /// The seed every member was compared against
    pub representative: ImageId,
    /// Claimed images, in the order they were claimed. Never empty.
    pub members: Vec<ImageId>,
    /// Score of each member against the representative
    pub scores: Vec<SimilarityScore>,
    /// Total file size of the members (representative excluded).
    /// Zero until file sizes are known.
    pub duplicate_size_bytes: u64,
}

impl DuplicateGroup {
    pub(crate) fn new(representative: ImageId, members: Vec<ImageId>, scores: Vec<SimilarityScore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            representative,
            members,
            scores,
            duplicate_size_bytes: 0,
        }
    }

    /// Representative first, then members in claim order
    pub fn all(&self) -> Vec<&ImageId> {
        std::iter::once(&self.representative)
            .chain(self.members.iter())
            .collect()
    }

    /// Number of duplicates (excluding the representative)
    pub fn duplicate_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, id: &ImageId) -> bool {
        &self.representative == id || self.members.contains(id)
    }

    /// Lowest member score; how loose the group is
    pub fn weakest_score(&self) -> Option<SimilarityScore> {
        self.scores.iter().copied().reduce(f64::min)
    }
}

/// What to do with an image that cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecodePolicy {
    /// Warn, record it as excluded, drop it from the pool and carry on
    #[default]
    Skip,
    /// End the run with the decode error
    Abort,
}

/// Engine settings
#[derive(Debug, Clone, Default)]
pub struct ClusterConfig {
    /// Score each seed's candidates on the rayon pool.
    /// Claiming stays sequential, so groups match the sequential run.
    pub parallel: bool,
    pub decode_policy: DecodePolicy,
    /// Upper bound on the time spent scanning the pool for one seed
    pub seed_deadline: Option<Duration>,
}

impl ClusterConfig {
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    pub fn seed_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.seed_deadline = deadline;
        self
    }
}

/// Everything a clustering run produced
#[derive(Debug, Default)]
pub struct ClusterOutcome {
    /// Groups in the order their seeds were processed
    pub groups: Vec<DuplicateGroup>,
    /// Images dropped because they could not be decoded
    pub excluded: Vec<(ImageId, DecodeError)>,
    /// Pairs scored, mismatches included
    pub comparisons: usize,
    /// Pairs that could not be scored because their shapes are incompatible
    pub dimension_mismatches: usize,
}

impl ClusterOutcome {
    pub fn total_duplicates(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    pub fn is_excluded(&self, id: &ImageId) -> bool {
        self.excluded.iter().any(|(excluded, _)| excluded == id)
    }
}
