use crate::domain::value_objects::{ComponentIndex, NodeIndex, SignatureIndex, StringIndex};

/// Longest digit run treated as a number; longer runs never match numerically
pub const MAX_NUMERIC_DIGITS: usize = 9;

/// One character range in a component's matching tree.
///
/// The node covers `position..position + length` of the input and matches when
/// that slice equals its characters. Children always start at or after the
/// end of their parent's range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    component: ComponentIndex,
    position: u16,
    characters: StringIndex,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    signatures: Vec<SignatureIndex>,
    // Resolved from the string pool when the dataset is assembled
    length: u16,
    numeric: Option<u32>,
}

impl Node {
    /// Reconstruct from storage
    pub fn reconstruct(
        component: ComponentIndex,
        position: u16,
        characters: StringIndex,
        parent: Option<NodeIndex>,
        children: Vec<NodeIndex>,
        signatures: Vec<SignatureIndex>,
    ) -> Self {
        Self {
            component,
            position,
            characters,
            parent,
            children,
            signatures,
            length: 0,
            numeric: None,
        }
    }

    /// Cache the range length and numeric value of the node's characters
    pub(crate) fn resolve(&mut self, characters: &str) {
        self.length = characters.len().min(u16::MAX as usize) as u16;
        self.numeric = parse_numeric(characters.as_bytes());
    }

    pub fn component(&self) -> ComponentIndex {
        self.component
    }

    pub fn position(&self) -> usize {
        self.position as usize
    }

    pub fn length(&self) -> usize {
        self.length as usize
    }

    /// First input offset after this node's range
    pub fn end(&self) -> usize {
        self.position() + self.length()
    }

    pub fn characters(&self) -> StringIndex {
        self.characters
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Signatures whose node sequence passes through this node
    pub fn signatures(&self) -> &[SignatureIndex] {
        &self.signatures
    }

    /// Numeric value when the characters are a short run of ASCII digits
    pub fn numeric(&self) -> Option<u32> {
        self.numeric
    }
}

/// Parse a complete digit run of at most [`MAX_NUMERIC_DIGITS`] digits
pub(crate) fn parse_numeric(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > MAX_NUMERIC_DIGITS {
        return None;
    }
    bytes.iter().try_fold(0u32, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}
