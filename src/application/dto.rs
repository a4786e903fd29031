use serde::Serialize;

use crate::domain::value_objects::{
    ComponentIndex, MatchMethod, ProfileIndex, PropertyValue, SignatureIndex,
};

/// Work counters for one match call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchMetrics {
    pub root_nodes_evaluated: u32,
    pub nodes_evaluated: u32,
    /// Node strings compared with the input. A node is compared at most once
    /// for matching; closest scoring reads it again for each candidate.
    pub strings_read: u32,
    pub signatures_read: u32,
    pub signatures_compared: u32,
    pub closest_signatures: u32,
}

/// Selection made for one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentMatch {
    pub component: ComponentIndex,
    /// Winning signature, `None` when the component's tree yielded no candidates
    pub signature: Option<SignatureIndex>,
    /// Selected profile; the component default when no signature won
    pub profile: Option<ProfileIndex>,
    pub method: MatchMethod,
    pub difference: u64,
}

/// Outcome of matching one input against a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// One entry per component, in declaration order
    pub components: Vec<ComponentMatch>,
    pub method: MatchMethod,
    pub difference: u64,
    pub metrics: MatchMetrics,
}

impl Match {
    pub fn component(&self, component: ComponentIndex) -> Option<&ComponentMatch> {
        self.components.iter().find(|c| c.component == component)
    }
}

/// A resolved profile of one component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileEntry {
    pub component: ComponentIndex,
    pub profile: ProfileIndex,
    pub profile_id: u32,
}

/// Profiles selected for a match, ordered by component declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileSet {
    pub entries: Vec<ProfileEntry>,
}

impl ProfileSet {
    pub fn profile_count(&self) -> usize {
        self.entries.len()
    }

    pub fn profile_ids(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.profile_id).collect()
    }

    /// Profile ids joined with `-`, one per resolved component
    pub fn device_id(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.profile_id.to_string())
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn profile_for(&self, component: ComponentIndex) -> Option<ProfileIndex> {
        self.entries
            .iter()
            .find(|e| e.component == component)
            .map(|e| e.profile)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedProperty {
    pub name: String,
    pub value: PropertyValue,
}

/// Required properties resolved against a profile set.
///
/// `partial` is set when a property could not be resolved; `entries` then
/// holds only the properties before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub entries: Vec<ProjectedProperty>,
    pub partial: bool,
}

impl Projection {
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }
}

/// Full detection result for one input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub profile_ids: Vec<u32>,
    pub device_id: String,
    pub properties: Vec<ProjectedProperty>,
    pub partial: bool,
    pub difference: u64,
    pub method: MatchMethod,
    pub metrics: MatchMetrics,
}

impl MatchResult {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}
