//! Unattended deletion: keep one random image per group.

use super::DeletionPlan;
use crate::core::cluster::DuplicateGroup;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

/// Keeps exactly one randomly chosen image of each group.
///
/// The survivor may be any image in the group, including a lower quality
/// copy. Nothing is asked before the plan is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnattendedPolicy;

impl UnattendedPolicy {
    pub fn plan<R: Rng + ?Sized>(&self, groups: &[DuplicateGroup], rng: &mut R) -> DeletionPlan {
        let mut plan = DeletionPlan::default();

        for group in groups {
            let mut images: Vec<_> = group.all().into_iter().cloned().collect();
            images.shuffle(rng);

            let mut images = images.into_iter();
            if let Some(survivor) = images.next() {
                plan.keep.push(survivor);
            }
            plan.delete.extend(images);
        }

        if !plan.is_empty() {
            warn!(
                "unattended mode will delete {} images without review",
                plan.len()
            );
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::ImageId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn group(names: &[&str]) -> DuplicateGroup {
        let ids: Vec<ImageId> = names.iter().map(|n| ImageId::from(*n)).collect();
        let scores = vec![0.9; ids.len() - 1];
        DuplicateGroup::new(ids[0].clone(), ids[1..].to_vec(), scores)
    }

    #[test]
    fn keeps_exactly_one_per_group() {
        let groups = [group(&["/a", "/b", "/c"]), group(&["/d", "/e"])];
        let mut rng = StdRng::seed_from_u64(7);

        let plan = UnattendedPolicy.plan(&groups, &mut rng);

        assert_eq!(plan.keep.len(), 2);
        assert_eq!(plan.delete.len(), 3);

        let everything: HashSet<_> = plan.keep.iter().chain(plan.delete.iter()).collect();
        assert_eq!(everything.len(), 5);

        let first_group: HashSet<_> = groups[0].all().into_iter().collect();
        let kept_in_first = plan.keep.iter().filter(|id| first_group.contains(id)).count();
        assert_eq!(kept_in_first, 1);
    }

    #[test]
    fn same_seed_same_plan() {
        let groups = [group(&["/a", "/b", "/c", "/d"])];

        let first = UnattendedPolicy.plan(&groups, &mut StdRng::seed_from_u64(42));
        let second = UnattendedPolicy.plan(&groups, &mut StdRng::seed_from_u64(42));

        assert_eq!(first, second);
    }

    #[test]
    fn survivor_is_not_always_the_representative() {
        let groups = [group(&["/a", "/b", "/c", "/d"])];

        let survivors: HashSet<ImageId> = (0..64)
            .map(|seed| UnattendedPolicy.plan(&groups, &mut StdRng::seed_from_u64(seed)).keep[0].clone())
            .collect();

        assert!(survivors.len() > 1);
    }

    #[test]
    fn no_groups_no_plan() {
        let plan = UnattendedPolicy.plan(&[], &mut StdRng::seed_from_u64(1));
        assert!(plan.is_empty());
        assert!(plan.keep.is_empty());
    }
}
