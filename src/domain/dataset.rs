//! The loaded, immutable reference corpus.
//!
//! Every table is a dense `Vec` and every cross reference is a typed index
//! into a sibling table. [`DataSet::assemble`] checks all of those references
//! once, so the matcher can index the tables without further bounds handling.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::entities::{Component, Node, Profile, Property, Signature, Value};
use crate::domain::errors::LoadError;
use crate::domain::value_objects::{
    Checksum, ComponentIndex, NodeIndex, ProfileIndex, PropertyIndex, SignatureIndex,
    StringIndex, ValueIndex,
};

/// Default number of input bytes considered by the matcher
pub const DEFAULT_MAX_SCAN_LENGTH: usize = 512;

/// Raw tables decoded from a dataset file, before validation
#[derive(Debug, Clone, Default)]
pub struct DataSetParts {
    pub version: u32,
    pub checksum: Checksum,
    pub strings: Vec<String>,
    pub components: Vec<Component>,
    pub properties: Vec<Property>,
    pub values: Vec<Value>,
    pub profiles: Vec<Profile>,
    pub signatures: Vec<Signature>,
    pub nodes: Vec<Node>,
    pub root_nodes: Vec<NodeIndex>,
}

/// Table sizes, for logging and inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataSetStats {
    pub strings: usize,
    pub components: usize,
    pub properties: usize,
    pub values: usize,
    pub profiles: usize,
    pub signatures: usize,
    pub nodes: usize,
    pub root_nodes: usize,
    pub required_properties: usize,
}

#[derive(Debug)]
pub struct DataSet {
    version: u32,
    checksum: Checksum,
    strings: Vec<String>,
    components: Vec<Component>,
    properties: Vec<Property>,
    values: Vec<Value>,
    profiles: Vec<Profile>,
    signatures: Vec<Signature>,
    nodes: Vec<Node>,
    component_roots: Vec<Vec<NodeIndex>>,
    property_names: HashMap<String, PropertyIndex>,
    required: Vec<PropertyIndex>,
    max_scan_length: usize,
}

impl DataSet {
    /// Validate decoded tables and build the derived indices.
    ///
    /// `required` names the properties to project, in output order. An empty
    /// list selects every property in dataset order.
    pub fn assemble(
        parts: DataSetParts,
        required: &[String],
        max_scan_length: usize,
    ) -> Result<Self, LoadError> {
        let DataSetParts {
            version,
            checksum,
            strings,
            components,
            mut properties,
            mut values,
            profiles,
            signatures,
            mut nodes,
            root_nodes,
        } = parts;

        let string_at = |index: StringIndex, what: &str| -> Result<&str, LoadError> {
            strings.get(index.as_usize()).map(String::as_str).ok_or_else(|| {
                LoadError::corrupt(format!("{} references string {} out of bounds", what, index))
            })
        };

        for (i, component) in components.iter().enumerate() {
            string_at(component.name(), &format!("component {}", i))?;
            if let Some(profile) = component.default_profile() {
                let owner = profiles.get(profile.as_usize()).map(Profile::component);
                if owner != Some(ComponentIndex::new(i as u32)) {
                    return Err(LoadError::corrupt(format!(
                        "component {} default profile {} is missing or owned by another component",
                        i, profile
                    )));
                }
            }
        }

        let mut property_names = HashMap::with_capacity(properties.len());
        for (i, property) in properties.iter().enumerate() {
            let name = string_at(property.name(), &format!("property {}", i))?;
            check_bound(property.component().get(), components.len(), "property", i)?;
            if property_names
                .insert(name.to_string(), PropertyIndex::new(i as u32))
                .is_some()
            {
                return Err(LoadError::corrupt(format!("duplicate property name {}", name)));
            }
        }

        for (i, value) in values.iter_mut().enumerate() {
            let name = string_at(value.name(), &format!("value {}", i))?;
            value.resolve(name);
            let property = properties.get_mut(value.property().as_usize()).ok_or_else(|| {
                LoadError::corrupt(format!("value {} references property {}", i, value.property()))
            })?;
            if value.is_default() {
                if property.default_value().is_some() {
                    return Err(LoadError::corrupt(format!(
                        "property {} has more than one default value",
                        value.property()
                    )));
                }
                property.set_default_value(ValueIndex::new(i as u32));
            }
        }

        for (i, profile) in profiles.iter().enumerate() {
            check_bound(profile.component().get(), components.len(), "profile", i)?;
            for &value in profile.values() {
                let owner = values
                    .get(value.as_usize())
                    .map(|v| properties[v.property().as_usize()].component());
                if owner != Some(profile.component()) {
                    return Err(LoadError::corrupt(format!(
                        "profile {} value {} is missing or belongs to another component",
                        profile.profile_id(),
                        value
                    )));
                }
            }
        }

        for (i, signature) in signatures.iter().enumerate() {
            if signature.nodes().is_empty() {
                return Err(LoadError::corrupt(format!("signature {} has no nodes", i)));
            }
            let mut last_position: Option<usize> = None;
            for &node in signature.nodes() {
                let position = nodes
                    .get(node.as_usize())
                    .map(Node::position)
                    .ok_or_else(|| {
                        LoadError::corrupt(format!("signature {} references node {}", i, node))
                    })?;
                if last_position.is_some_and(|last| position <= last) {
                    return Err(LoadError::corrupt(format!(
                        "signature {} nodes are not ordered by position",
                        i
                    )));
                }
                last_position = Some(position);
            }
            if signature.profiles().len() != components.len() {
                return Err(LoadError::corrupt(format!(
                    "signature {} has {} profiles for {} components",
                    i,
                    signature.profiles().len(),
                    components.len()
                )));
            }
            for (slot, &profile) in signature.profiles().iter().enumerate() {
                let owner = profiles.get(profile.as_usize()).map(Profile::component);
                if owner != Some(ComponentIndex::new(slot as u32)) {
                    return Err(LoadError::corrupt(format!(
                        "signature {} profile {} does not belong to component {}",
                        i, profile, slot
                    )));
                }
            }
        }

        for (i, node) in nodes.iter_mut().enumerate() {
            let characters = string_at(node.characters(), &format!("node {}", i))?;
            node.resolve(characters);
        }

        let mut child_refs = vec![0u32; nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            let this = NodeIndex::new(i as u32);
            check_bound(node.component().get(), components.len(), "node", i)?;
            if let Some(parent) = node.parent() {
                check_bound(parent.get(), nodes.len(), "node", i)?;
            }
            for &child_index in node.children() {
                let child = nodes.get(child_index.as_usize()).ok_or_else(|| {
                    LoadError::corrupt(format!("node {} references child {}", i, child_index))
                })?;
                if child.parent() != Some(this)
                    || child.component() != node.component()
                    || child.position() < node.end()
                {
                    return Err(LoadError::corrupt(format!(
                        "node {} child {} breaks the tree ordering",
                        i, child_index
                    )));
                }
                child_refs[child_index.as_usize()] += 1;
            }
            for &signature in node.signatures() {
                let contains = signatures
                    .get(signature.as_usize())
                    .is_some_and(|s| s.nodes().contains(&this));
                if !contains {
                    return Err(LoadError::corrupt(format!(
                        "node {} lists signature {} which does not contain it",
                        i, signature
                    )));
                }
            }
        }
        for (i, node) in nodes.iter().enumerate() {
            let expected = u32::from(!node.is_root());
            if child_refs[i] != expected {
                return Err(LoadError::corrupt(format!(
                    "node {} is referenced {} times as a child",
                    i, child_refs[i]
                )));
            }
        }

        let mut component_roots = vec![Vec::new(); components.len()];
        let mut seen_roots = vec![false; nodes.len()];
        for &root in &root_nodes {
            let node = nodes
                .get(root.as_usize())
                .ok_or_else(|| LoadError::corrupt(format!("root node {} out of bounds", root)))?;
            if !node.is_root() || seen_roots[root.as_usize()] {
                return Err(LoadError::corrupt(format!(
                    "root node {} has a parent or is listed twice",
                    root
                )));
            }
            seen_roots[root.as_usize()] = true;
            component_roots[node.component().as_usize()].push(root);
        }

        let required = if required.is_empty() {
            (0..properties.len() as u32).map(PropertyIndex::new).collect()
        } else {
            required
                .iter()
                .map(|name| {
                    property_names
                        .get(name.trim())
                        .copied()
                        .ok_or_else(|| LoadError::UnknownProperty(name.trim().to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            version,
            checksum,
            strings,
            components,
            properties,
            values,
            profiles,
            signatures,
            nodes,
            component_roots,
            property_names,
            required,
            max_scan_length,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// Input bytes beyond this offset are ignored by the matcher
    pub fn max_scan_length(&self) -> usize {
        self.max_scan_length
    }

    #[inline]
    pub fn string(&self, index: StringIndex) -> &str {
        &self.strings[index.as_usize()]
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, index: ComponentIndex) -> &Component {
        &self.components[index.as_usize()]
    }

    pub fn component_name(&self, index: ComponentIndex) -> &str {
        self.string(self.component(index).name())
    }

    /// Matching entry points of a component's tree
    pub fn root_nodes(&self, component: ComponentIndex) -> &[NodeIndex] {
        &self.component_roots[component.as_usize()]
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, index: PropertyIndex) -> &Property {
        &self.properties[index.as_usize()]
    }

    pub fn property_name(&self, index: PropertyIndex) -> &str {
        self.string(self.property(index).name())
    }

    pub fn property_by_name(&self, name: &str) -> Option<PropertyIndex> {
        self.property_names.get(name).copied()
    }

    /// Properties to project, in output order
    pub fn required_properties(&self) -> &[PropertyIndex] {
        &self.required
    }

    pub fn value(&self, index: ValueIndex) -> &Value {
        &self.values[index.as_usize()]
    }

    pub fn value_name(&self, index: ValueIndex) -> &str {
        self.string(self.value(index).name())
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn profile(&self, index: ProfileIndex) -> &Profile {
        &self.profiles[index.as_usize()]
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    #[inline]
    pub fn signature(&self, index: SignatureIndex) -> &Signature {
        &self.signatures[index.as_usize()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.as_usize()]
    }

    pub fn stats(&self) -> DataSetStats {
        DataSetStats {
            strings: self.strings.len(),
            components: self.components.len(),
            properties: self.properties.len(),
            values: self.values.len(),
            profiles: self.profiles.len(),
            signatures: self.signatures.len(),
            nodes: self.nodes.len(),
            root_nodes: self.component_roots.iter().map(Vec::len).sum(),
            required_properties: self.required.len(),
        }
    }
}

fn check_bound(index: u32, len: usize, what: &str, i: usize) -> Result<(), LoadError> {
    if (index as usize) < len {
        Ok(())
    } else {
        Err(LoadError::corrupt(format!(
            "{} {} reference {} out of bounds ({} entries)",
            what, i, index, len
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One component with a two-node path `"Chrome/"` then `"120"`
    fn chrome_parts() -> DataSetParts {
        DataSetParts {
            version: 3,
            strings: ["Browser", "BrowserName", "Chrome", "Chrome/", "120"]
                .map(String::from)
                .to_vec(),
            components: vec![Component::reconstruct(StringIndex::new(0), None)],
            properties: vec![Property::reconstruct(
                StringIndex::new(1),
                ComponentIndex::new(0),
            )],
            values: vec![Value::reconstruct(
                PropertyIndex::new(0),
                StringIndex::new(2),
                false,
            )],
            profiles: vec![Profile::reconstruct(
                15364,
                ComponentIndex::new(0),
                vec![ValueIndex::new(0)],
            )],
            signatures: vec![Signature::reconstruct(
                vec![NodeIndex::new(0), NodeIndex::new(1)],
                10,
                vec![ProfileIndex::new(0)],
            )],
            nodes: vec![
                chrome_node(0, 3, None, vec![NodeIndex::new(1)], vec![0]),
                chrome_node(7, 4, Some(0), vec![], vec![0]),
            ],
            root_nodes: vec![NodeIndex::new(0)],
            ..Default::default()
        }
    }

    fn chrome_node(
        position: u16,
        characters: u32,
        parent: Option<u32>,
        children: Vec<NodeIndex>,
        signatures: Vec<u32>,
    ) -> Node {
        Node::reconstruct(
            ComponentIndex::new(0),
            position,
            StringIndex::new(characters),
            parent.map(NodeIndex::new),
            children,
            signatures.into_iter().map(SignatureIndex::new).collect(),
        )
    }

    fn assert_corrupt(parts: DataSetParts, fragment: &str) {
        match DataSet::assemble(parts, &[], DEFAULT_MAX_SCAN_LENGTH) {
            Err(LoadError::CorruptData(message)) => {
                assert!(message.contains(fragment), "unexpected message: {}", message)
            }
            other => panic!("expected CorruptData, got {:?}", other),
        }
    }

    #[test]
    fn test_assemble_valid_parts() {
        let dataset = DataSet::assemble(chrome_parts(), &[], DEFAULT_MAX_SCAN_LENGTH).unwrap();

        assert_eq!(dataset.root_nodes(ComponentIndex::new(0)), &[NodeIndex::new(0)]);
        assert_eq!(dataset.node(NodeIndex::new(1)).end(), 10);
        assert_eq!(dataset.node(NodeIndex::new(1)).numeric(), Some(120));
        assert_eq!(dataset.required_properties(), &[PropertyIndex::new(0)]);
    }

    #[test]
    fn test_node_signature_out_of_bounds() {
        let mut parts = chrome_parts();
        parts.nodes[1] = chrome_node(7, 4, Some(0), vec![], vec![5]);
        assert_corrupt(parts, "lists signature 5");
    }

    #[test]
    fn test_node_signature_without_that_node() {
        let mut parts = chrome_parts();
        parts.signatures.push(Signature::reconstruct(
            vec![NodeIndex::new(0)],
            7,
            vec![ProfileIndex::new(0)],
        ));
        parts.nodes[1] = chrome_node(7, 4, Some(0), vec![], vec![0, 1]);
        assert_corrupt(parts, "lists signature 1");
    }

    #[test]
    fn test_child_inside_parent_range() {
        let mut parts = chrome_parts();
        parts.nodes[1] = chrome_node(3, 4, Some(0), vec![], vec![0]);
        assert_corrupt(parts, "breaks the tree ordering");
    }

    #[test]
    fn test_child_not_listed_by_parent() {
        let mut parts = chrome_parts();
        parts.nodes[0] = chrome_node(0, 3, None, vec![], vec![0]);
        assert_corrupt(parts, "referenced 0 times");
    }

    #[test]
    fn test_root_listed_twice() {
        let mut parts = chrome_parts();
        parts.root_nodes.push(NodeIndex::new(0));
        assert_corrupt(parts, "listed twice");
    }

    #[test]
    fn test_child_listed_as_root() {
        let mut parts = chrome_parts();
        parts.root_nodes.push(NodeIndex::new(1));
        assert_corrupt(parts, "root node 1");
    }

    #[test]
    fn test_signature_profile_count() {
        let mut parts = chrome_parts();
        parts.signatures[0] =
            Signature::reconstruct(vec![NodeIndex::new(0), NodeIndex::new(1)], 10, vec![]);
        assert_corrupt(parts, "0 profiles for 1 components");
    }

    #[test]
    fn test_signature_nodes_out_of_order() {
        let mut parts = chrome_parts();
        parts.signatures[0] = Signature::reconstruct(
            vec![NodeIndex::new(1), NodeIndex::new(0)],
            10,
            vec![ProfileIndex::new(0)],
        );
        assert_corrupt(parts, "not ordered by position");
    }

    #[test]
    fn test_string_out_of_bounds() {
        let mut parts = chrome_parts();
        parts.nodes[1] = chrome_node(7, 40, Some(0), vec![], vec![0]);
        assert_corrupt(parts, "string 40 out of bounds");
    }

    #[test]
    fn test_missing_default_profile() {
        let mut parts = chrome_parts();
        parts.components[0] =
            Component::reconstruct(StringIndex::new(0), Some(ProfileIndex::new(3)));
        assert_corrupt(parts, "default profile 3");
    }

    #[test]
    fn test_unknown_required_property() {
        let err = DataSet::assemble(
            chrome_parts(),
            &["BrowserVersion".to_string()],
            DEFAULT_MAX_SCAN_LENGTH,
        )
        .err()
        .unwrap();
        assert_eq!(err, LoadError::UnknownProperty("BrowserVersion".into()));
    }
}
