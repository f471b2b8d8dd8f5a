//! Terminal prompts for choosing what to delete.

use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, MultiSelect};
use similar_image_finder::core::cleanup::{DeletionPlan, ReviewSelector, Selection};
use similar_image_finder::core::cluster::DuplicateGroup;
use similar_image_finder::error::{DuplicateFinderError, Result};

/// Asks the operator, group by group, which images to delete.
///
/// Nothing starts ticked. Space toggles, Enter accepts, Esc or `q` leaves
/// the group alone (and offers to stop reviewing altogether).
pub struct TerminalSelector {
    theme: ColorfulTheme,
}

impl TerminalSelector {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl ReviewSelector for TerminalSelector {
    fn select(&mut self, group: &DuplicateGroup, index: usize, total: usize) -> Result<Selection> {
        let mut items = vec![format!("{}  (representative)", group.representative)];
        items.extend(
            group
                .members
                .iter()
                .zip(&group.scores)
                .map(|(member, score)| format!("{}  ({:.3})", member, score)),
        );
        let defaults = vec![false; items.len()];

        let chosen = MultiSelect::with_theme(&self.theme)
            .with_prompt(format!(
                "Group {}/{}: select images to {}",
                index + 1,
                total,
                style("DELETE").red().bold()
            ))
            .items(&items)
            .defaults(&defaults)
            .interact_opt()
            .map_err(prompt_error)?;

        match chosen {
            Some(indices) => Ok(Selection::Indices(indices)),
            None => {
                let stop = Confirm::with_theme(&self.theme)
                    .with_prompt("Stop reviewing the remaining groups?")
                    .default(false)
                    .interact()
                    .map_err(prompt_error)?;
                Ok(if stop { Selection::Quit } else { Selection::Skip })
            }
        }
    }
}

/// Final yes/no before anything is removed. Defaults to no.
pub fn confirm_deletion(plan: &DeletionPlan) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Permanently delete {} files? This cannot be undone",
            plan.len()
        ))
        .default(false)
        .interact()
        .map_err(prompt_error)
}

fn prompt_error(error: dialoguer::Error) -> DuplicateFinderError {
    DuplicateFinderError::Prompt(error.to_string())
}
