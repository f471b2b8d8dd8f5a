//! Match threshold for the clustering engine.

use crate::core::similarity::SimilarityScore;
use crate::error::CompareError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum score a candidate must *exceed* to join a seed's group.
///
/// Always strictly between 0 and 1.
///
/// Recommended thresholds:
/// - 0.9: Conservative, only near-identical copies
/// - 0.8: Balanced (default)
/// - 0.7: Permissive, catches re-encodes and light edits
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SimilarityThreshold(f64);

impl SimilarityThreshold {
    pub fn new(value: f64) -> Result<Self, CompareError> {
        // Written this way round so NaN is rejected too
        if value > 0.0 && value < 1.0 {
            Ok(Self(value))
        } else {
            Err(CompareError::InvalidThreshold { value })
        }
    }

    pub fn conservative() -> Self {
        Self(0.9)
    }

    pub fn balanced() -> Self {
        Self(0.8)
    }

    pub fn permissive() -> Self {
        Self(0.7)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// A score equal to the threshold is not a match
    pub fn is_match(&self, score: SimilarityScore) -> bool {
        score > self.0
    }
}

impl Default for SimilarityThreshold {
    fn default() -> Self {
        Self::balanced()
    }
}

impl TryFrom<f64> for SimilarityThreshold {
    type Error = CompareError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for SimilarityThreshold {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for SimilarityThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_values_strictly_inside_unit_interval() {
        assert_eq!(SimilarityThreshold::new(0.8).unwrap().value(), 0.8);
        assert!(SimilarityThreshold::new(f64::MIN_POSITIVE).is_ok());
    }

    #[test]
    fn rejects_bounds_and_nan() {
        for value in [0.0, 1.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    SimilarityThreshold::new(value),
                    Err(CompareError::InvalidThreshold { .. })
                ),
                "{} should be rejected",
                value
            );
        }
    }

    #[test]
    fn equal_score_is_not_a_match() {
        let threshold = SimilarityThreshold::new(0.5).unwrap();
        assert!(!threshold.is_match(0.5));
        assert!(threshold.is_match(0.500_001));
        assert!(!threshold.is_match(-1.0));
    }

    #[test]
    fn presets_are_ordered() {
        assert!(SimilarityThreshold::conservative() > SimilarityThreshold::balanced());
        assert!(SimilarityThreshold::balanced() > SimilarityThreshold::permissive());
        assert_eq!(SimilarityThreshold::default(), SimilarityThreshold::balanced());
    }

    #[test]
    fn deserialization_validates() {
        let ok: SimilarityThreshold = serde_json::from_str("0.75").unwrap();
        assert_eq!(ok.value(), 0.75);
        assert!(serde_json::from_str::<SimilarityThreshold>("1.0").is_err());
    }
}
