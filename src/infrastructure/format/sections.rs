//! Section layouts (little-endian, counts first):
//!
//! ```text
//! strings     u32 n, n x { u16 len, len bytes UTF-8 }
//! components  u32 n, n x { u32 name, u32 default_profile | NO_INDEX }
//! properties  u32 n, n x { u32 name, u32 component }
//! values      u32 n, n x { u32 property, u32 name, u8 flags (bit 0 = default) }
//! profiles    u32 n, n x { u32 profile_id, u32 component, u32 k, k x u32 value }
//! signatures  u32 n, n x { u32 rank, u16 k, k x u32 node, u16 c, c x u32 profile }
//! nodes       u32 n, n x { u32 component, u16 position, u32 characters,
//!                          u32 parent | NO_INDEX, u16 k, k x u32 child,
//!                          u32 s, s x u32 signature }
//! root nodes  u32 n, n x u32 node
//! ```

use bytes::{Buf, BufMut};

use super::header::Section;
use crate::domain::entities::{Component, Node, Profile, Property, Signature, Value};
use crate::domain::errors::LoadError;
use crate::domain::value_objects::{
    ComponentIndex, NodeIndex, ProfileIndex, PropertyIndex, SignatureIndex, StringIndex,
    ValueIndex, NO_INDEX,
};

/// Value flag: this value is the property's default
pub const VALUE_FLAG_DEFAULT: u8 = 0x01;

/// Bounds-checked reader over one decoded section
pub(crate) struct SectionCursor<'a> {
    section: Section,
    buf: &'a [u8],
}

impl<'a> SectionCursor<'a> {
    pub(crate) fn new(section: Section, buf: &'a [u8]) -> Self {
        Self { section, buf }
    }

    fn truncated(&self, wanted: usize) -> LoadError {
        LoadError::corrupt(format!(
            "{} section truncated: wanted {} bytes, {} remaining",
            self.section.name(),
            wanted,
            self.buf.remaining()
        ))
    }

    fn ensure(&self, wanted: usize) -> Result<(), LoadError> {
        if self.buf.remaining() < wanted {
            return Err(self.truncated(wanted));
        }
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> Result<u8, LoadError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub(crate) fn u16(&mut self) -> Result<u16, LoadError> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub(crate) fn u32(&mut self) -> Result<u32, LoadError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8], LoadError> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Read an entry count and check the section can hold that many records
    /// of at least `min_record` bytes before anything is allocated.
    pub(crate) fn count(&mut self, min_record: usize) -> Result<usize, LoadError> {
        let count = self.u32()? as usize;
        self.ensure(count.saturating_mul(min_record))?;
        Ok(count)
    }

    fn indices<T>(&mut self, len: usize, make: fn(u32) -> T) -> Result<Vec<T>, LoadError> {
        self.ensure(len.saturating_mul(4))?;
        let mut out = alloc_table(self.section.name(), len)?;
        for _ in 0..len {
            out.push(make(self.buf.get_u32_le()));
        }
        Ok(out)
    }

    /// Every byte of a section must be consumed
    pub(crate) fn finish(self) -> Result<(), LoadError> {
        if self.buf.has_remaining() {
            return Err(LoadError::corrupt(format!(
                "{} section has {} trailing bytes",
                self.section.name(),
                self.buf.remaining()
            )));
        }
        Ok(())
    }
}

/// Allocate a table without aborting the process when memory runs out
pub(crate) fn alloc_table<T>(table: &'static str, count: usize) -> Result<Vec<T>, LoadError> {
    let mut table_vec = Vec::new();
    table_vec
        .try_reserve_exact(count)
        .map_err(|_| LoadError::InsufficientMemory {
            table,
            requested: count,
        })?;
    Ok(table_vec)
}

pub(crate) fn decode_strings(data: &[u8]) -> Result<Vec<String>, LoadError> {
    let mut cursor = SectionCursor::new(Section::Strings, data);
    let count = cursor.count(2)?;
    let mut strings = alloc_table("strings", count)?;
    for i in 0..count {
        let len = cursor.u16()? as usize;
        let bytes = cursor.bytes(len)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|e| LoadError::corrupt(format!("string {} is not UTF-8: {}", i, e)))?;
        strings.push(s.to_string());
    }
    cursor.finish()?;
    Ok(strings)
}

pub(crate) fn decode_components(data: &[u8]) -> Result<Vec<Component>, LoadError> {
    let mut cursor = SectionCursor::new(Section::Components, data);
    let count = cursor.count(8)?;
    let mut components = alloc_table("components", count)?;
    for _ in 0..count {
        let name = StringIndex::new(cursor.u32()?);
        let default_profile = ProfileIndex::from_raw(cursor.u32()?);
        components.push(Component::reconstruct(name, default_profile));
    }
    cursor.finish()?;
    Ok(components)
}

pub(crate) fn decode_properties(data: &[u8]) -> Result<Vec<Property>, LoadError> {
    let mut cursor = SectionCursor::new(Section::Properties, data);
    let count = cursor.count(8)?;
    let mut properties = alloc_table("properties", count)?;
    for _ in 0..count {
        let name = StringIndex::new(cursor.u32()?);
        let component = ComponentIndex::new(cursor.u32()?);
        properties.push(Property::reconstruct(name, component));
    }
    cursor.finish()?;
    Ok(properties)
}

pub(crate) fn decode_values(data: &[u8]) -> Result<Vec<Value>, LoadError> {
    let mut cursor = SectionCursor::new(Section::Values, data);
    let count = cursor.count(9)?;
    let mut values = alloc_table("values", count)?;
    for _ in 0..count {
        let property = PropertyIndex::new(cursor.u32()?);
        let name = StringIndex::new(cursor.u32()?);
        let flags = cursor.u8()?;
        values.push(Value::reconstruct(
            property,
            name,
            flags & VALUE_FLAG_DEFAULT != 0,
        ));
    }
    cursor.finish()?;
    Ok(values)
}

pub(crate) fn decode_profiles(data: &[u8]) -> Result<Vec<Profile>, LoadError> {
    let mut cursor = SectionCursor::new(Section::Profiles, data);
    let count = cursor.count(12)?;
    let mut profiles = alloc_table("profiles", count)?;
    for _ in 0..count {
        let profile_id = cursor.u32()?;
        let component = ComponentIndex::new(cursor.u32()?);
        let value_count = cursor.u32()? as usize;
        let values = cursor.indices(value_count, ValueIndex::new)?;
        profiles.push(Profile::reconstruct(profile_id, component, values));
    }
    cursor.finish()?;
    Ok(profiles)
}

pub(crate) fn decode_signatures(data: &[u8]) -> Result<Vec<Signature>, LoadError> {
    let mut cursor = SectionCursor::new(Section::Signatures, data);
    let count = cursor.count(8)?;
    let mut signatures = alloc_table("signatures", count)?;
    for _ in 0..count {
        let rank = cursor.u32()?;
        let node_count = cursor.u16()? as usize;
        let nodes = cursor.indices(node_count, NodeIndex::new)?;
        let profile_count = cursor.u16()? as usize;
        let profiles = cursor.indices(profile_count, ProfileIndex::new)?;
        signatures.push(Signature::reconstruct(nodes, rank, profiles));
    }
    cursor.finish()?;
    Ok(signatures)
}

pub(crate) fn decode_nodes(data: &[u8]) -> Result<Vec<Node>, LoadError> {
    let mut cursor = SectionCursor::new(Section::Nodes, data);
    let count = cursor.count(20)?;
    let mut nodes = alloc_table("nodes", count)?;
    for _ in 0..count {
        let component = ComponentIndex::new(cursor.u32()?);
        let position = cursor.u16()?;
        let characters = StringIndex::new(cursor.u32()?);
        let parent = NodeIndex::from_raw(cursor.u32()?);
        let child_count = cursor.u16()? as usize;
        let children = cursor.indices(child_count, NodeIndex::new)?;
        let signature_count = cursor.u32()? as usize;
        let signatures = cursor.indices(signature_count, SignatureIndex::new)?;
        nodes.push(Node::reconstruct(
            component, position, characters, parent, children, signatures,
        ));
    }
    cursor.finish()?;
    Ok(nodes)
}

pub(crate) fn decode_root_nodes(data: &[u8]) -> Result<Vec<NodeIndex>, LoadError> {
    let mut cursor = SectionCursor::new(Section::RootNodes, data);
    let count = cursor.count(4)?;
    let roots = cursor.indices(count, NodeIndex::new)?;
    cursor.finish()?;
    Ok(roots)
}

/// Write raw indices; the caller writes the count first
pub(crate) fn put_indices(buf: &mut Vec<u8>, indices: &[u32]) {
    for &index in indices {
        buf.put_u32_le(index);
    }
}

/// Encode an optional reference with the on-disk sentinel
pub(crate) fn optional_raw(index: Option<u32>) -> u32 {
    index.unwrap_or(NO_INDEX)
}
