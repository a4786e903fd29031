use crate::domain::value_objects::{ComponentIndex, ValueIndex};

/// A bundle of property values for one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    profile_id: u32,
    component: ComponentIndex,
    values: Vec<ValueIndex>,
}

impl Profile {
    pub fn reconstruct(profile_id: u32, component: ComponentIndex, values: Vec<ValueIndex>) -> Self {
        Self {
            profile_id,
            component,
            values,
        }
    }

    /// Published identifier, stable across dataset releases
    pub fn profile_id(&self) -> u32 {
        self.profile_id
    }

    pub fn component(&self) -> ComponentIndex {
        self.component
    }

    /// Values in stored order
    pub fn values(&self) -> &[ValueIndex] {
        &self.values
    }
}
