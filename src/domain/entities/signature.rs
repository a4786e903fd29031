use crate::domain::value_objects::{ComponentIndex, NodeIndex, ProfileIndex};

/// A known device fingerprint: nodes ordered by position, a rank, and one
/// profile per component.
///
/// Higher rank means more specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    nodes: Vec<NodeIndex>,
    rank: u32,
    profiles: Vec<ProfileIndex>,
}

impl Signature {
    pub fn reconstruct(nodes: Vec<NodeIndex>, rank: u32, profiles: Vec<ProfileIndex>) -> Self {
        Self {
            nodes,
            rank,
            profiles,
        }
    }

    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Profiles in component declaration order
    pub fn profiles(&self) -> &[ProfileIndex] {
        &self.profiles
    }

    pub fn profile_for(&self, component: ComponentIndex) -> Option<ProfileIndex> {
        self.profiles.get(component.as_usize()).copied()
    }
}
