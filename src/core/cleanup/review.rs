//! Interactive selection of what to delete.

use super::DeletionPlan;
use crate::core::cluster::DuplicateGroup;
use crate::error::DuplicateFinderError;
use tracing::debug;

/// The operator's decision for one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Delete these positions of `group.all()`. May be empty, may be all.
    Indices(Vec<usize>),
    /// Leave the group untouched and move on
    Skip,
    /// Stop reviewing; later groups are left untouched
    Quit,
}

/// Asks someone which images of a group to delete.
///
/// Nothing is pre-selected and no image is protected: the operator may
/// delete the representative, or every image in the group.
pub trait ReviewSelector {
    /// `index` is zero-based, `total` is the number of groups
    fn select(
        &mut self,
        group: &DuplicateGroup,
        index: usize,
        total: usize,
    ) -> Result<Selection, DuplicateFinderError>;
}

/// Review every group in order and collect the choices
pub fn plan_with_selector(
    groups: &[DuplicateGroup],
    selector: &mut dyn ReviewSelector,
) -> Result<DeletionPlan, DuplicateFinderError> {
    let mut plan = DeletionPlan::default();

    for (index, group) in groups.iter().enumerate() {
        let all = group.all();

        let mut chosen = match selector.select(group, index, groups.len())? {
            Selection::Indices(indices) => indices,
            Selection::Skip => {
                debug!("group {} skipped", group.id);
                continue;
            }
            Selection::Quit => {
                debug!("review stopped at group {} of {}", index + 1, groups.len());
                break;
            }
        };
        chosen.sort_unstable();
        chosen.dedup();

        if let Some(&bad) = chosen.iter().find(|&&i| i >= all.len()) {
            return Err(DuplicateFinderError::Config(format!(
                "selection {} is out of range for a group of {} images",
                bad,
                all.len()
            )));
        }

        for (position, id) in all.into_iter().enumerate() {
            if chosen.binary_search(&position).is_ok() {
                plan.delete.push(id.clone());
            } else {
                plan.keep.push(id.clone());
            }
        }
    }

    Ok(plan)
}
