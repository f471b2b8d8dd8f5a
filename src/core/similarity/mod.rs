//! # Similarity Module
//!
//! Scores how alike two rasters are.
//!
//! The scorer first checks that both rasters have the same channel
//! count. If their width or height differ, the second raster is resized
//! to the first one's dimensions, so the first argument is always the
//! reference. The metric then sees two same-shaped buffers.
//!
//! ## Metrics
//! - `Ssim` - mean structural similarity, 7×7 uniform window

mod resize;
mod ssim;

pub use resize::{resize_to_match, RasterResizer};
pub use ssim::Ssim;

use crate::core::raster::Raster;
use crate::error::DimensionError;
use std::borrow::Cow;
use tracing::trace;

/// Similarity in `[-1, 1]`; `1.0` means identical
pub type SimilarityScore = f64;

/// A full-reference image quality measure.
///
/// Implementations receive rasters that already share width, height and
/// channel count.
pub trait SimilarityMetric: Send + Sync {
    fn score(&self, reference: &Raster, other: &Raster) -> Result<SimilarityScore, DimensionError>;

    fn name(&self) -> &'static str;
}

/// Compares rasters of possibly different sizes
pub struct SimilarityScorer {
    metric: Box<dyn SimilarityMetric>,
}

impl SimilarityScorer {
    pub fn new(metric: Box<dyn SimilarityMetric>) -> Self {
        Self { metric }
    }

    /// Scorer backed by the default SSIM parameters
    pub fn ssim() -> Self {
        Self::new(Box::new(Ssim::default()))
    }

    pub fn metric_name(&self) -> &'static str {
        self.metric.name()
    }

    /// Score `other` against `reference`.
    ///
    /// Not symmetric when sizes differ: `other` is the one resampled.
    pub fn compare(&self, reference: &Raster, other: &Raster) -> Result<SimilarityScore, DimensionError> {
        if reference.channels() != other.channels() {
            return Err(DimensionError::ChannelMismatch {
                reference: reference.channels(),
                other: other.channels(),
            });
        }

        let other = if reference.same_dimensions(other) {
            Cow::Borrowed(other)
        } else {
            trace!(
                "resizing {}x{} to {}x{} before scoring",
                other.width(),
                other.height(),
                reference.width(),
                reference.height()
            );
            Cow::Owned(resize_to_match(other, reference)?)
        };

        self.metric.score(reference, &other)
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::ssim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(width: u32, height: u32) -> Raster {
        // Smooth enough that resampling keeps the structure
        Raster::from_fn(width, height, 3, |x, y, c| {
            let fx = x as f64 / width as f64;
            let fy = y as f64 / height as f64;
            let v = match c {
                0 => fx,
                1 => fy,
                _ => (fx + fy) / 2.0,
            };
            (v * 255.0) as u8
        })
        .unwrap()
    }

    #[test]
    fn same_size_identical_scores_one() {
        let scorer = SimilarityScorer::ssim();
        let image = pattern(32, 24);

        assert_eq!(scorer.compare(&image, &image).unwrap(), 1.0);
    }

    #[test]
    fn resized_copy_scores_high() {
        let scorer = SimilarityScorer::ssim();
        let large = pattern(128, 96);
        let small = pattern(64, 48);

        let score = scorer.compare(&small, &large).unwrap();

        assert!(score > 0.9, "score was {}", score);
    }

    #[test]
    fn channel_mismatch_is_reported_before_resizing() {
        let scorer = SimilarityScorer::ssim();
        let gray = Raster::new(4, 4, 1, vec![0; 16]).unwrap();
        let rgba = Raster::new(8, 8, 4, vec![0; 256]).unwrap();

        assert_eq!(
            scorer.compare(&gray, &rgba),
            Err(DimensionError::ChannelMismatch {
                reference: 1,
                other: 4
            })
        );
    }

    #[test]
    fn unrelated_images_score_low() {
        let scorer = SimilarityScorer::ssim();
        let image = pattern(32, 32);
        let noise = Raster::from_fn(32, 32, 3, |x, y, c| {
            ((x * 97 + y * 31 + c as u32 * 53) % 251) as u8
        })
        .unwrap();

        let score = scorer.compare(&image, &noise).unwrap();

        assert!(score < 0.5, "score was {}", score);
    }

    #[test]
    fn scorer_reports_metric_name() {
        assert_eq!(SimilarityScorer::default().metric_name(), "SSIM");
    }
}
