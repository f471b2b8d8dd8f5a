//! # Cleanup Module
//!
//! Turns duplicate groups into a deletion plan and carries it out.
//!
//! ## Planning
//! - `plan_with_selector` - an operator picks what to delete in each group
//!   through a `ReviewSelector` (the CLI uses a terminal prompt)
//! - `UnattendedPolicy` - keeps one random image per group and deletes the
//!   rest. **High risk**: the kept image is not chosen by quality.
//!
//! ## Deleting
//! `FileDeleter` permanently removes files. A failure is recorded for that
//! file and the batch continues. A dry run only reports what would go.

mod deleter;
mod review;
mod unattended;

pub use deleter::{DeleteFailure, DeleteFailureKind, DeletionActuator, DeletionReport, FileDeleter};
pub use review::{plan_with_selector, ReviewSelector, Selection};
pub use unattended::UnattendedPolicy;

use crate::core::raster::ImageId;
use serde::{Deserialize, Serialize};

/// What to delete, and what the operator chose to keep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionPlan {
    /// Images to remove, in review order
    pub delete: Vec<ImageId>,
    /// Images from reviewed groups that were left alone
    pub keep: Vec<ImageId>,
}

impl DeletionPlan {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.delete.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_plan() {
        let plan = DeletionPlan::default();
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
    }

    #[test]
    fn plan_round_trips_through_json() {
        let plan = DeletionPlan {
            delete: vec![ImageId::from("/b.png")],
            keep: vec![ImageId::from("/a.png")],
        };

        let json = serde_json::to_string(&plan).unwrap();

        assert_eq!(json, r#"{"delete":["/b.png"],"keep":["/a.png"]}"#);
        assert_eq!(serde_json::from_str::<DeletionPlan>(&json).unwrap(), plan);
    }
}
