use crate::application::dto::{Match, ProfileEntry, ProfileSet};
use crate::domain::DataSet;

/// Collect the profile chosen for each component, in declaration order.
/// Components without a selected or default profile are skipped.
pub fn resolve_profiles(dataset: &DataSet, matched: &Match) -> ProfileSet {
    let entries = matched
        .components
        .iter()
        .filter_map(|c| {
            c.profile.map(|profile| ProfileEntry {
                component: c.component,
                profile,
                profile_id: dataset.profile(profile).profile_id(),
            })
        })
        .collect();
    ProfileSet { entries }
}
