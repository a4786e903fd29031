//! Dataset writer for building dataset files
//!
//! Used by dataset tooling and test fixtures. The writer enforces the same
//! structural rules the loader checks, so anything it finalizes will load.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use bytes::BufMut;

use super::checksum::SectionHasher;
use super::header::{DatasetHeader, Section, DATASET_HEADER_SIZE};
use super::sections::{optional_raw, put_indices, VALUE_FLAG_DEFAULT};
use crate::domain::value_objects::{
    ComponentIndex, NodeIndex, ProfileIndex, PropertyIndex, SignatureIndex, ValueIndex,
};

/// Errors that can occur during writing
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Property already added: {0}")]
    DuplicateProperty(String),

    #[error("Unknown {table} reference: {index}")]
    UnknownReference { table: &'static str, index: u32 },

    #[error("Invalid dataset data: {0}")]
    InvalidData(String),
}

struct ComponentDraft {
    name: u32,
    default_profile: Option<u32>,
}

struct PropertyDraft {
    name: u32,
    component: ComponentIndex,
    has_default: bool,
}

struct ValueDraft {
    property: PropertyIndex,
    name: u32,
    is_default: bool,
}

struct ProfileDraft {
    profile_id: u32,
    component: ComponentIndex,
    values: Vec<u32>,
}

struct SignatureDraft {
    rank: u32,
    nodes: Vec<u32>,
    profiles: Vec<u32>,
}

struct NodeDraft {
    component: ComponentIndex,
    position: u16,
    characters: u32,
    length: usize,
    parent: Option<u32>,
    children: Vec<u32>,
    signatures: Vec<u32>,
}

impl NodeDraft {
    fn end(&self) -> usize {
        self.position as usize + self.length
    }
}

/// Builder for dataset files
pub struct DataSetWriter {
    strings: Vec<String>,
    string_lookup: HashMap<String, u32>,
    components: Vec<ComponentDraft>,
    properties: Vec<PropertyDraft>,
    property_names: HashMap<String, PropertyIndex>,
    values: Vec<ValueDraft>,
    profiles: Vec<ProfileDraft>,
    signatures: Vec<SignatureDraft>,
    nodes: Vec<NodeDraft>,
    root_nodes: Vec<u32>,
    // (component, parent, position, characters) -> node
    node_lookup: HashMap<(ComponentIndex, Option<u32>, u16, u32), NodeIndex>,
    compress: bool,
}

impl DataSetWriter {
    /// Create a writer that stores every section uncompressed
    pub fn new() -> Self {
        Self {
            strings: Vec::new(),
            string_lookup: HashMap::new(),
            components: Vec::new(),
            properties: Vec::new(),
            property_names: HashMap::new(),
            values: Vec::new(),
            profiles: Vec::new(),
            signatures: Vec::new(),
            nodes: Vec::new(),
            root_nodes: Vec::new(),
            node_lookup: HashMap::new(),
            compress: false,
        }
    }

    /// Compress every section with zlib when finalizing.
    ///
    /// Has no effect when the `compression` feature is disabled.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&index) = self.string_lookup.get(s) {
            return index;
        }
        let index = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.string_lookup.insert(s.to_string(), index);
        index
    }

    fn check_component(&self, component: ComponentIndex) -> Result<(), WriteError> {
        check_reference("component", component.get(), self.components.len())
    }

    /// Declare a component; declaration order is matching order
    pub fn add_component(&mut self, name: &str) -> ComponentIndex {
        let index = ComponentIndex::new(self.components.len() as u32);
        let name = self.intern(name);
        self.components.push(ComponentDraft {
            name,
            default_profile: None,
        });
        index
    }

    /// Profile reported for a component when its tree yields no candidates
    pub fn set_default_profile(
        &mut self,
        component: ComponentIndex,
        profile: ProfileIndex,
    ) -> Result<(), WriteError> {
        self.check_component(component)?;
        let owner = self
            .profiles
            .get(profile.as_usize())
            .map(|p| p.component)
            .ok_or(WriteError::UnknownReference {
                table: "profile",
                index: profile.get(),
            })?;
        if owner != component {
            return Err(WriteError::InvalidData(format!(
                "profile {} belongs to component {}, not {}",
                profile, owner, component
            )));
        }
        self.components[component.as_usize()].default_profile = Some(profile.get());
        Ok(())
    }

    pub fn add_property(
        &mut self,
        name: &str,
        component: ComponentIndex,
    ) -> Result<PropertyIndex, WriteError> {
        self.check_component(component)?;
        if self.property_names.contains_key(name) {
            return Err(WriteError::DuplicateProperty(name.to_string()));
        }
        let index = PropertyIndex::new(self.properties.len() as u32);
        let name_index = self.intern(name);
        self.properties.push(PropertyDraft {
            name: name_index,
            component,
            has_default: false,
        });
        self.property_names.insert(name.to_string(), index);
        Ok(index)
    }

    pub fn add_value(&mut self, property: PropertyIndex, name: &str) -> Result<ValueIndex, WriteError> {
        self.push_value(property, name, false)
    }

    /// Add the value projected when no matched profile supplies the property
    pub fn add_default_value(
        &mut self,
        property: PropertyIndex,
        name: &str,
    ) -> Result<ValueIndex, WriteError> {
        self.push_value(property, name, true)
    }

    fn push_value(
        &mut self,
        property: PropertyIndex,
        name: &str,
        is_default: bool,
    ) -> Result<ValueIndex, WriteError> {
        check_reference("property", property.get(), self.properties.len())?;
        if is_default {
            let draft = &mut self.properties[property.as_usize()];
            if draft.has_default {
                return Err(WriteError::InvalidData(format!(
                    "property {} already has a default value",
                    property
                )));
            }
            draft.has_default = true;
        }
        let index = ValueIndex::new(self.values.len() as u32);
        let name = self.intern(name);
        self.values.push(ValueDraft {
            property,
            name,
            is_default,
        });
        Ok(index)
    }

    /// Add a profile; its values are projected in the order given
    pub fn add_profile(
        &mut self,
        profile_id: u32,
        component: ComponentIndex,
        values: &[ValueIndex],
    ) -> Result<ProfileIndex, WriteError> {
        self.check_component(component)?;
        for &value in values {
            let property = self
                .values
                .get(value.as_usize())
                .map(|v| v.property)
                .ok_or(WriteError::UnknownReference {
                    table: "value",
                    index: value.get(),
                })?;
            if self.properties[property.as_usize()].component != component {
                return Err(WriteError::InvalidData(format!(
                    "value {} belongs to another component than profile {}",
                    value, profile_id
                )));
            }
        }
        let index = ProfileIndex::new(self.profiles.len() as u32);
        self.profiles.push(ProfileDraft {
            profile_id,
            component,
            values: values.iter().map(|v| v.get()).collect(),
        });
        Ok(index)
    }

    /// Find or create a root node of a component's tree
    pub fn add_root_node(
        &mut self,
        component: ComponentIndex,
        position: usize,
        characters: &str,
    ) -> Result<NodeIndex, WriteError> {
        self.check_component(component)?;
        self.find_or_add_node(component, None, position, characters)
    }

    /// Find or create a child node; it must start at or after the parent's end
    pub fn add_child_node(
        &mut self,
        parent: NodeIndex,
        position: usize,
        characters: &str,
    ) -> Result<NodeIndex, WriteError> {
        let parent_node = self
            .nodes
            .get(parent.as_usize())
            .ok_or(WriteError::UnknownReference {
                table: "node",
                index: parent.get(),
            })?;
        if position < parent_node.end() {
            return Err(WriteError::InvalidData(format!(
                "child at {} starts inside parent node {} ending at {}",
                position,
                parent,
                parent_node.end()
            )));
        }
        let component = parent_node.component;
        self.find_or_add_node(component, Some(parent.get()), position, characters)
    }

    fn find_or_add_node(
        &mut self,
        component: ComponentIndex,
        parent: Option<u32>,
        position: usize,
        characters: &str,
    ) -> Result<NodeIndex, WriteError> {
        let position = u16::try_from(position).map_err(|_| {
            WriteError::InvalidData(format!("node position {} out of range", position))
        })?;
        if characters.is_empty() {
            return Err(WriteError::InvalidData("node characters are empty".into()));
        }
        let characters_index = self.intern(characters);
        let key = (component, parent, position, characters_index);
        if let Some(&existing) = self.node_lookup.get(&key) {
            return Ok(existing);
        }

        let index = NodeIndex::new(self.nodes.len() as u32);
        self.nodes.push(NodeDraft {
            component,
            position,
            characters: characters_index,
            length: characters.len(),
            parent,
            children: Vec::new(),
            signatures: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent as usize].children.push(index.get()),
            None => self.root_nodes.push(index.get()),
        }
        self.node_lookup.insert(key, index);
        Ok(index)
    }

    /// Add a chain of nodes, each the child of the previous one
    pub fn add_path(
        &mut self,
        component: ComponentIndex,
        path: &[(usize, &str)],
    ) -> Result<Vec<NodeIndex>, WriteError> {
        let mut nodes = Vec::with_capacity(path.len());
        for &(position, characters) in path {
            let node = match nodes.last() {
                Some(&parent) => self.add_child_node(parent, position, characters)?,
                None => self.add_root_node(component, position, characters)?,
            };
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Add a signature ranked by the total length of its nodes
    pub fn add_signature(
        &mut self,
        nodes: &[NodeIndex],
        profiles: &[ProfileIndex],
    ) -> Result<SignatureIndex, WriteError> {
        let rank = nodes
            .iter()
            .filter_map(|n| self.nodes.get(n.as_usize()))
            .map(|n| n.length as u32)
            .sum();
        self.add_signature_with_rank(nodes, profiles, rank)
    }

    /// Add a signature with an explicit rank.
    ///
    /// Nodes may come from any component but must be listed in strictly
    /// increasing position order. Exactly one profile per declared component
    /// is required, in declaration order.
    pub fn add_signature_with_rank(
        &mut self,
        nodes: &[NodeIndex],
        profiles: &[ProfileIndex],
        rank: u32,
    ) -> Result<SignatureIndex, WriteError> {
        if nodes.is_empty() {
            return Err(WriteError::InvalidData("signature has no nodes".into()));
        }
        let mut last_position = None;
        for &node in nodes {
            let draft = self
                .nodes
                .get(node.as_usize())
                .ok_or(WriteError::UnknownReference {
                    table: "node",
                    index: node.get(),
                })?;
            if last_position.is_some_and(|last| draft.position <= last) {
                return Err(WriteError::InvalidData(
                    "signature nodes must have strictly increasing positions".into(),
                ));
            }
            last_position = Some(draft.position);
        }

        if profiles.len() != self.components.len() {
            return Err(WriteError::InvalidData(format!(
                "signature needs {} profiles, got {}",
                self.components.len(),
                profiles.len()
            )));
        }
        for (slot, &profile) in profiles.iter().enumerate() {
            let owner = self
                .profiles
                .get(profile.as_usize())
                .map(|p| p.component)
                .ok_or(WriteError::UnknownReference {
                    table: "profile",
                    index: profile.get(),
                })?;
            if owner.as_usize() != slot {
                return Err(WriteError::InvalidData(format!(
                    "signature profile {} is not a component {} profile",
                    profile, slot
                )));
            }
        }

        let index = SignatureIndex::new(self.signatures.len() as u32);
        for &node in nodes {
            self.nodes[node.as_usize()].signatures.push(index.get());
        }
        self.signatures.push(SignatureDraft {
            rank,
            nodes: nodes.iter().map(|n| n.get()).collect(),
            profiles: profiles.iter().map(|p| p.get()).collect(),
        });
        Ok(index)
    }

    fn encode_section(&self, section: Section) -> Result<Vec<u8>, WriteError> {
        let mut buf = Vec::new();
        match section {
            Section::Strings => {
                buf.put_u32_le(self.strings.len() as u32);
                for s in &self.strings {
                    buf.put_u16_le(short_count(s.len(), "string bytes")?);
                    buf.put_slice(s.as_bytes());
                }
            }
            Section::Components => {
                buf.put_u32_le(self.components.len() as u32);
                for component in &self.components {
                    buf.put_u32_le(component.name);
                    buf.put_u32_le(optional_raw(component.default_profile));
                }
            }
            Section::Properties => {
                buf.put_u32_le(self.properties.len() as u32);
                for property in &self.properties {
                    buf.put_u32_le(property.name);
                    buf.put_u32_le(property.component.get());
                }
            }
            Section::Values => {
                buf.put_u32_le(self.values.len() as u32);
                for value in &self.values {
                    buf.put_u32_le(value.property.get());
                    buf.put_u32_le(value.name);
                    buf.put_u8(if value.is_default { VALUE_FLAG_DEFAULT } else { 0 });
                }
            }
            Section::Profiles => {
                buf.put_u32_le(self.profiles.len() as u32);
                for profile in &self.profiles {
                    buf.put_u32_le(profile.profile_id);
                    buf.put_u32_le(profile.component.get());
                    buf.put_u32_le(profile.values.len() as u32);
                    put_indices(&mut buf, &profile.values);
                }
            }
            Section::Signatures => {
                buf.put_u32_le(self.signatures.len() as u32);
                for signature in &self.signatures {
                    buf.put_u32_le(signature.rank);
                    buf.put_u16_le(short_count(signature.nodes.len(), "signature nodes")?);
                    put_indices(&mut buf, &signature.nodes);
                    buf.put_u16_le(short_count(signature.profiles.len(), "signature profiles")?);
                    put_indices(&mut buf, &signature.profiles);
                }
            }
            Section::Nodes => {
                buf.put_u32_le(self.nodes.len() as u32);
                for node in &self.nodes {
                    buf.put_u32_le(node.component.get());
                    buf.put_u16_le(node.position);
                    buf.put_u32_le(node.characters);
                    buf.put_u32_le(optional_raw(node.parent));
                    buf.put_u16_le(short_count(node.children.len(), "node children")?);
                    put_indices(&mut buf, &node.children);
                    buf.put_u32_le(node.signatures.len() as u32);
                    put_indices(&mut buf, &node.signatures);
                }
            }
            Section::RootNodes => {
                buf.put_u32_le(self.root_nodes.len() as u32);
                put_indices(&mut buf, &self.root_nodes);
            }
        }
        Ok(buf)
    }

    /// Compress data using zlib with the zlib-rs backend
    #[cfg(feature = "compression")]
    fn compress_data(&self, data: &[u8]) -> Result<Vec<u8>, WriteError> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;

        // Index tables compress to roughly half
        let estimated_size = data.len() / 2;
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(estimated_size.max(256)),
            Compression::default(),
        );
        encoder
            .write_all(data)
            .map_err(|e| WriteError::Compression(format!("Write failed: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| WriteError::Compression(format!("Finish failed: {}", e)))
    }

    #[cfg(not(feature = "compression"))]
    fn compress_data(&self, data: &[u8]) -> Result<Vec<u8>, WriteError> {
        Ok(data.to_vec())
    }

    fn should_compress(&self) -> bool {
        self.compress && cfg!(feature = "compression")
    }

    /// Finalize the dataset and return the file bytes
    pub fn finalize(self) -> Result<Vec<u8>, WriteError> {
        for (i, component) in self.components.iter().enumerate() {
            if !self.root_nodes.iter().any(|&r| self.nodes[r as usize].component.as_usize() == i)
                && component.default_profile.is_none()
            {
                tracing::warn!(
                    component = %self.strings[component.name as usize],
                    "component has neither nodes nor a default profile"
                );
            }
        }

        let mut header = DatasetHeader::new();
        let mut stored = Vec::with_capacity(Section::all().len());
        for &section in Section::all() {
            let encoded = self.encode_section(section)?;
            let data = if self.should_compress() {
                header.flags |= section.flag();
                self.compress_data(&encoded)?
            } else {
                encoded
            };
            let size = u32::try_from(data.len()).map_err(|_| {
                WriteError::InvalidData(format!("{} section exceeds 4 GiB", section.name()))
            })?;
            header.set_section_size(section, size);
            stored.push(data);
        }

        header.checksum =
            *SectionHasher::digest_stored(header.flags, stored.iter().map(Vec::as_slice)).as_bytes();

        let total_size = DATASET_HEADER_SIZE + stored.iter().map(Vec::len).sum::<usize>();
        let mut buffer = Vec::with_capacity(total_size);
        header.write_to_buffer(&mut buffer);
        for data in &stored {
            buffer.extend_from_slice(data);
        }

        debug_assert_eq!(buffer.len(), total_size);
        Ok(buffer)
    }

    /// Finalize and write the dataset to a file
    pub fn write_to_path(self, path: impl AsRef<Path>) -> Result<(), WriteError> {
        let bytes = self.finalize()?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        Ok(())
    }
}

impl Default for DataSetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn check_reference(table: &'static str, index: u32, len: usize) -> Result<(), WriteError> {
    if (index as usize) < len {
        Ok(())
    } else {
        Err(WriteError::UnknownReference { table, index })
    }
}

fn short_count(len: usize, what: &str) -> Result<u16, WriteError> {
    u16::try_from(len).map_err(|_| WriteError::InvalidData(format!("too many {}: {}", what, len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::format::reader::DataSetReader;

    fn browser_writer() -> (DataSetWriter, ComponentIndex, ProfileIndex) {
        let mut writer = DataSetWriter::new();
        let browser = writer.add_component("Browser");
        let name = writer.add_property("BrowserName", browser).unwrap();
        let value = writer.add_value(name, "Edge").unwrap();
        let profile = writer.add_profile(7, browser, &[value]).unwrap();
        (writer, browser, profile)
    }

    #[test]
    fn test_writer_new() {
        let writer = DataSetWriter::new();
        assert!(writer.strings.is_empty());
        assert!(writer.nodes.is_empty());
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let (mut writer, browser, _) = browser_writer();
        let result = writer.add_property("BrowserName", browser);
        assert!(matches!(result, Err(WriteError::DuplicateProperty(_))));
    }

    #[test]
    fn test_second_default_value_rejected() {
        let (mut writer, browser, _) = browser_writer();
        let property = writer.add_property("BrowserVendor", browser).unwrap();
        writer.add_default_value(property, "Unknown").unwrap();
        assert!(writer.add_default_value(property, "None").is_err());
    }

    #[test]
    fn test_nodes_are_shared_between_paths() {
        let (mut writer, browser, _) = browser_writer();
        let a = writer.add_path(browser, &[(0, "Edg/"), (4, "120")]).unwrap();
        let b = writer.add_path(browser, &[(0, "Edg/"), (4, "121")]).unwrap();

        assert_eq!(a[0], b[0]);
        assert_ne!(a[1], b[1]);
        assert_eq!(writer.root_nodes.len(), 1);
        assert_eq!(writer.nodes[a[0].as_usize()].children.len(), 2);
    }

    #[test]
    fn test_child_inside_parent_rejected() {
        let (mut writer, browser, _) = browser_writer();
        let root = writer.add_root_node(browser, 0, "Edg/").unwrap();
        let result = writer.add_child_node(root, 2, "g/");
        assert!(matches!(result, Err(WriteError::InvalidData(_))));
    }

    #[test]
    fn test_signature_rank_defaults_to_node_length() {
        let (mut writer, browser, profile) = browser_writer();
        let nodes = writer.add_path(browser, &[(0, "Edg/"), (4, "120")]).unwrap();
        let signature = writer.add_signature(&nodes, &[profile]).unwrap();

        assert_eq!(writer.signatures[signature.as_usize()].rank, 7);
        assert_eq!(writer.nodes[nodes[1].as_usize()].signatures, vec![0]);
    }

    #[test]
    fn test_signature_requires_profile_per_component() {
        let (mut writer, browser, profile) = browser_writer();
        writer.add_component("Crawler");
        let nodes = writer.add_path(browser, &[(0, "Edg/")]).unwrap();

        let result = writer.add_signature(&nodes, &[profile]);
        assert!(matches!(result, Err(WriteError::InvalidData(_))));
    }

    #[test]
    fn test_signature_positions_must_increase() {
        let (mut writer, browser, profile) = browser_writer();
        let first = writer.add_root_node(browser, 5, "Edg/").unwrap();
        let second = writer.add_root_node(browser, 0, "Mozilla").unwrap();

        let result = writer.add_signature(&[first, second], &[profile]);
        assert!(matches!(result, Err(WriteError::InvalidData(_))));
    }

    #[test]
    fn test_finalize_is_readable() {
        let (mut writer, browser, profile) = browser_writer();
        writer.set_default_profile(browser, profile).unwrap();
        let nodes = writer.add_path(browser, &[(0, "Edg/")]).unwrap();
        writer.add_signature(&nodes, &[profile]).unwrap();

        let data = writer.finalize().unwrap();
        let reader = DataSetReader::from_slice(&data).unwrap();
        let parts = reader.read_parts().unwrap();
        assert_eq!(parts.strings, vec!["Browser", "BrowserName", "Edge", "Edg/"]);
        assert_eq!(parts.components[0].default_profile(), Some(profile));
    }

    #[test]
    fn test_write_to_path() {
        let (writer, _, _) = browser_writer();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.dpd");

        writer.write_to_path(&path).unwrap();
        let data = std::fs::read(&path).unwrap();
        assert!(DataSetReader::from_slice(&data).is_ok());
    }
}
