use crate::domain::value_objects::{
    ComponentIndex, ProfileIndex, PropertyIndex, StringIndex, ValueIndex, ValueLiteral,
};

/// A functional category of profile (hardware, browser, crawler, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    name: StringIndex,
    default_profile: Option<ProfileIndex>,
}

impl Component {
    pub fn reconstruct(name: StringIndex, default_profile: Option<ProfileIndex>) -> Self {
        Self {
            name,
            default_profile,
        }
    }

    pub fn name(&self) -> StringIndex {
        self.name
    }

    /// Profile used when nothing in this component's tree is reachable
    pub fn default_profile(&self) -> Option<ProfileIndex> {
        self.default_profile
    }
}

/// A named capability owned by exactly one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: StringIndex,
    component: ComponentIndex,
    default_value: Option<ValueIndex>,
}

impl Property {
    pub fn reconstruct(name: StringIndex, component: ComponentIndex) -> Self {
        Self {
            name,
            component,
            default_value: None,
        }
    }

    pub(crate) fn set_default_value(&mut self, value: ValueIndex) {
        self.default_value = Some(value);
    }

    pub fn name(&self) -> StringIndex {
        self.name
    }

    pub fn component(&self) -> ComponentIndex {
        self.component
    }

    pub fn default_value(&self) -> Option<ValueIndex> {
        self.default_value
    }
}

/// One possible content of a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    property: PropertyIndex,
    name: StringIndex,
    is_default: bool,
    literal: ValueLiteral,
}

impl Value {
    pub fn reconstruct(property: PropertyIndex, name: StringIndex, is_default: bool) -> Self {
        Self {
            property,
            name,
            is_default,
            literal: ValueLiteral::Text,
        }
    }

    pub(crate) fn resolve(&mut self, name: &str) {
        self.literal = ValueLiteral::from_name(name);
    }

    pub fn property(&self) -> PropertyIndex {
        self.property
    }

    pub fn name(&self) -> StringIndex {
        self.name
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn literal(&self) -> ValueLiteral {
        self.literal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_resolve_literal() {
        let mut value = Value::reconstruct(PropertyIndex::new(0), StringIndex::new(3), false);
        assert_eq!(value.literal(), ValueLiteral::Text);

        value.resolve("True");
        assert_eq!(value.literal(), ValueLiteral::Boolean(true));
    }

    #[test]
    fn test_property_default_value() {
        let mut property = Property::reconstruct(StringIndex::new(1), ComponentIndex::new(0));
        assert_eq!(property.default_value(), None);

        property.set_default_value(ValueIndex::new(4));
        assert_eq!(property.default_value(), Some(ValueIndex::new(4)));
    }
}
