//! Dataset file header
//!
//! ```text
//! Device Pattern Dataset Format v3
//! ================================
//!
//! Header (80 bytes, little-endian):
//! - Magic: "DDPT\x00\x00\x00\x00" (8 bytes)
//! - Version: 3 (4 bytes)
//! - Flags: per-section compression flags (4 bytes)
//! - Section sizes, as stored (8 x 4 bytes): strings, components,
//!   properties, values, profiles, signatures, nodes, root nodes
//! - Checksum: SHA-256 over the flags and all section bytes as stored (32 bytes)
//!
//! Sections follow the header in the order above.
//! ```

use crate::domain::errors::LoadError;

/// Dataset magic bytes
pub const DATASET_MAGIC: &[u8; 8] = b"DDPT\0\0\0\0";

/// The only dataset format version this crate reads
pub const DATASET_VERSION: u32 = 3;

/// Number of sections following the header
pub const SECTION_COUNT: usize = 8;

/// Header size in bytes
pub const DATASET_HEADER_SIZE: usize = 8 + 4 + 4 + SECTION_COUNT * 4 + 32;

/// Compression flags
pub mod flags {
    /// No compression
    pub const NONE: u32 = 0x0000_0000;

    /// Every section compressed
    pub const COMPRESS_ALL: u32 = 0x0000_00ff;
}

/// Sections of a dataset file, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Strings,
    Components,
    Properties,
    Values,
    Profiles,
    Signatures,
    Nodes,
    RootNodes,
}

impl Section {
    /// All sections in storage order
    pub fn all() -> &'static [Section; SECTION_COUNT] {
        &[
            Section::Strings,
            Section::Components,
            Section::Properties,
            Section::Values,
            Section::Profiles,
            Section::Signatures,
            Section::Nodes,
            Section::RootNodes,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Section::Strings => "strings",
            Section::Components => "components",
            Section::Properties => "properties",
            Section::Values => "values",
            Section::Profiles => "profiles",
            Section::Signatures => "signatures",
            Section::Nodes => "nodes",
            Section::RootNodes => "root nodes",
        }
    }

    #[inline]
    pub fn slot(&self) -> usize {
        *self as usize
    }

    /// Compression flag bit for this section
    #[inline]
    pub fn flag(&self) -> u32 {
        1 << self.slot()
    }
}

/// Dataset file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetHeader {
    pub magic: [u8; 8],
    pub version: u32,
    pub flags: u32,
    /// Section sizes as stored (compressed when flagged)
    pub section_sizes: [u32; SECTION_COUNT],
    pub checksum: [u8; 32],
}

impl DatasetHeader {
    pub fn new() -> Self {
        Self {
            magic: *DATASET_MAGIC,
            version: DATASET_VERSION,
            flags: flags::NONE,
            section_sizes: [0; SECTION_COUNT],
            checksum: [0; 32],
        }
    }

    /// Parse the header from the start of a dataset file.
    ///
    /// Only the layout is checked here; call [`validate`](Self::validate) for
    /// magic and version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() < DATASET_HEADER_SIZE {
            return Err(LoadError::corrupt(format!(
                "header must be {} bytes, got {}",
                DATASET_HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[0..8]);
        let version = read_u32(bytes, 8);
        let flags = read_u32(bytes, 12);
        let mut section_sizes = [0u32; SECTION_COUNT];
        for (slot, size) in section_sizes.iter_mut().enumerate() {
            *size = read_u32(bytes, 16 + slot * 4);
        }
        let checksum_offset = 16 + SECTION_COUNT * 4;
        let mut checksum = [0u8; 32];
        checksum.copy_from_slice(&bytes[checksum_offset..checksum_offset + 32]);

        Ok(Self {
            magic,
            version,
            flags,
            section_sizes,
            checksum,
        })
    }

    /// Validate magic bytes and version
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.magic != *DATASET_MAGIC {
            return Err(LoadError::IncorrectVersion(format!(
                "invalid magic bytes: expected {:?}, got {:?}",
                DATASET_MAGIC, self.magic
            )));
        }

        if self.version != DATASET_VERSION {
            return Err(LoadError::IncorrectVersion(format!(
                "unsupported version: expected {}, got {}",
                DATASET_VERSION, self.version
            )));
        }

        if self.flags & !flags::COMPRESS_ALL != 0 {
            return Err(LoadError::IncorrectVersion(format!(
                "unsupported flags: {:#010x}",
                self.flags
            )));
        }

        Ok(())
    }

    #[inline]
    pub fn is_compressed(&self, section: Section) -> bool {
        (self.flags & section.flag()) != 0
    }

    #[inline]
    pub fn section_size(&self, section: Section) -> u32 {
        self.section_sizes[section.slot()]
    }

    pub fn set_section_size(&mut self, section: Section, size: u32) {
        self.section_sizes[section.slot()] = size;
    }

    /// Offset of a section from the start of the file
    #[inline]
    pub fn section_offset(&self, section: Section) -> u64 {
        let preceding: u64 = self.section_sizes[..section.slot()]
            .iter()
            .map(|&size| size as u64)
            .sum();
        DATASET_HEADER_SIZE as u64 + preceding
    }

    /// Total size of all sections as stored
    pub fn payload_size(&self) -> u64 {
        self.section_sizes.iter().map(|&size| size as u64).sum()
    }

    /// Write header directly to buffer
    #[inline]
    pub fn write_to_buffer(&self, buffer: &mut Vec<u8>) {
        buffer.reserve(DATASET_HEADER_SIZE);

        buffer.extend_from_slice(&self.magic);
        buffer.extend_from_slice(&self.version.to_le_bytes());
        buffer.extend_from_slice(&self.flags.to_le_bytes());
        for size in &self.section_sizes {
            buffer.extend_from_slice(&size.to_le_bytes());
        }
        buffer.extend_from_slice(&self.checksum);
    }
}

impl Default for DatasetHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
