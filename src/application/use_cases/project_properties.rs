use tracing::debug;

use crate::application::dto::{ProfileSet, ProjectedProperty, Projection};
use crate::domain::value_objects::{PropertyIndex, PropertyValue, ValueIndex, ValueLiteral};
use crate::domain::DataSet;

/// Project the dataset's required properties from a profile set.
///
/// Properties come out in the required order. Each takes the values its
/// owning component's profile stores for it, or the property default when
/// that profile stores none. The first property that cannot be resolved
/// stops the projection, and the result is flagged partial.
pub fn project_properties(dataset: &DataSet, profiles: &ProfileSet) -> Projection {
    let required = dataset.required_properties();
    let mut entries = Vec::with_capacity(required.len());

    for &property in required {
        match project_one(dataset, profiles, property) {
            Some(value) => entries.push(ProjectedProperty {
                name: dataset.property_name(property).to_string(),
                value,
            }),
            None => {
                debug!(
                    property = dataset.property_name(property),
                    resolved = entries.len(),
                    "property unresolved, projection stopped"
                );
                return Projection {
                    entries,
                    partial: true,
                };
            }
        }
    }

    Projection {
        entries,
        partial: false,
    }
}

fn project_one(
    dataset: &DataSet,
    profiles: &ProfileSet,
    property: PropertyIndex,
) -> Option<PropertyValue> {
    let definition = dataset.property(property);
    let profile = profiles.profile_for(definition.component())?;

    let mut values: Vec<ValueIndex> = dataset
        .profile(profile)
        .values()
        .iter()
        .copied()
        .filter(|&v| dataset.value(v).property() == property)
        .collect();
    if values.is_empty() {
        values.push(definition.default_value()?);
    }

    Some(match values.as_slice() {
        [single] => match dataset.value(*single).literal() {
            ValueLiteral::Boolean(b) => PropertyValue::Boolean(b),
            ValueLiteral::Text => PropertyValue::Text(dataset.value_name(*single).to_string()),
        },
        many => PropertyValue::List(
            many.iter()
                .map(|&v| dataset.value_name(v).to_string())
                .collect(),
        ),
    })
}
