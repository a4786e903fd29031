//! Dataset reader: header, checksum, decompression and table decoding

use std::borrow::Cow;

use tracing::debug;

use super::checksum::SectionHasher;
use super::header::{DatasetHeader, Section, DATASET_HEADER_SIZE};
use super::sections;
use crate::domain::errors::LoadError;
use crate::domain::value_objects::Checksum;
use crate::domain::DataSetParts;

/// Reader over the bytes of one dataset file
pub struct DataSetReader<'a> {
    header: DatasetHeader,
    data: &'a [u8],
}

impl<'a> DataSetReader<'a> {
    /// Parse and verify the header, section bounds and checksum
    pub fn from_slice(data: &'a [u8]) -> Result<Self, LoadError> {
        let header = DatasetHeader::from_bytes(data)?;
        header.validate()?;

        let expected = DATASET_HEADER_SIZE as u64 + header.payload_size();
        if expected != data.len() as u64 {
            return Err(LoadError::corrupt(format!(
                "sections declare {} bytes but the file holds {}",
                expected,
                data.len()
            )));
        }

        let actual = SectionHasher::digest_stored(header.flags, [&data[DATASET_HEADER_SIZE..]]);
        if actual.as_bytes() != &header.checksum {
            return Err(LoadError::corrupt(format!(
                "checksum mismatch: expected {}, got {}",
                Checksum::from_bytes(header.checksum),
                actual
            )));
        }

        Ok(Self { header, data })
    }

    pub fn header(&self) -> &DatasetHeader {
        &self.header
    }

    pub fn checksum(&self) -> Checksum {
        Checksum::from_bytes(self.header.checksum)
    }

    /// Section bytes exactly as stored
    pub fn section_raw(&self, section: Section) -> &'a [u8] {
        let offset = self.header.section_offset(section) as usize;
        let size = self.header.section_size(section) as usize;
        &self.data[offset..offset + size]
    }

    /// Section bytes, inflated when the section is stored compressed
    pub fn section(&self, section: Section) -> Result<Cow<'a, [u8]>, LoadError> {
        let raw = self.section_raw(section);
        if self.header.is_compressed(section) {
            decompress_section(section, raw).map(Cow::Owned)
        } else {
            Ok(Cow::Borrowed(raw))
        }
    }

    /// Decode every table. References are not checked here; see
    /// [`DataSet::assemble`](crate::domain::DataSet::assemble).
    pub fn read_parts(&self) -> Result<DataSetParts, LoadError> {
        let parts = DataSetParts {
            version: self.header.version,
            checksum: self.checksum(),
            strings: sections::decode_strings(&self.section(Section::Strings)?)?,
            components: sections::decode_components(&self.section(Section::Components)?)?,
            properties: sections::decode_properties(&self.section(Section::Properties)?)?,
            values: sections::decode_values(&self.section(Section::Values)?)?,
            profiles: sections::decode_profiles(&self.section(Section::Profiles)?)?,
            signatures: sections::decode_signatures(&self.section(Section::Signatures)?)?,
            nodes: sections::decode_nodes(&self.section(Section::Nodes)?)?,
            root_nodes: sections::decode_root_nodes(&self.section(Section::RootNodes)?)?,
        };

        debug!(
            strings = parts.strings.len(),
            signatures = parts.signatures.len(),
            nodes = parts.nodes.len(),
            "decoded dataset tables"
        );

        Ok(parts)
    }

    /// Per-section stored sizes, for inspection
    pub fn stats(&self) -> SectionStats {
        SectionStats {
            total_size: self.data.len(),
            header_size: DATASET_HEADER_SIZE,
            sections: Section::all()
                .iter()
                .map(|&section| SectionStat {
                    name: section.name(),
                    stored_size: self.header.section_size(section) as usize,
                    compressed: self.header.is_compressed(section),
                })
                .collect(),
        }
    }
}

/// Stored size of one section
#[derive(Debug, Clone, serde::Serialize)]
pub struct SectionStat {
    pub name: &'static str,
    pub stored_size: usize,
    pub compressed: bool,
}

/// Dataset file layout statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct SectionStats {
    pub total_size: usize,
    pub header_size: usize,
    pub sections: Vec<SectionStat>,
}

/// Largest inflated section accepted, whatever the stored size
#[cfg(feature = "compression")]
const MAX_INFLATED_SECTION_SIZE: usize = 1 << 30;

/// Upper bound of the deflate format's expansion ratio
#[cfg(feature = "compression")]
const MAX_DEFLATE_RATIO: usize = 1032;

/// Inflate a zlib-compressed section
#[cfg(feature = "compression")]
fn decompress_section(section: Section, data: &[u8]) -> Result<Vec<u8>, LoadError> {
    let limit = data
        .len()
        .saturating_mul(MAX_DEFLATE_RATIO)
        .min(MAX_INFLATED_SECTION_SIZE);
    inflate(section, data, limit)
}

/// Inflate at most `limit` bytes; a stream that inflates further is corrupt
#[cfg(feature = "compression")]
fn inflate(section: Section, data: &[u8], limit: usize) -> Result<Vec<u8>, LoadError> {
    use flate2::read::ZlibDecoder;
    use std::io::{ErrorKind, Read};

    let inflate_error = |e: std::io::Error| {
        LoadError::corrupt(format!("{} section failed to decompress: {}", section.name(), e))
    };

    // zlib typically achieves 2-4x on these tables
    let estimated_size = data.len().saturating_mul(3).max(1024).min(limit);
    let mut decompressed = Vec::new();
    decompressed
        .try_reserve(estimated_size)
        .map_err(|_| LoadError::InsufficientMemory {
            table: section.name(),
            requested: estimated_size,
        })?;

    let mut decoder = ZlibDecoder::new(data).take(limit as u64 + 1);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let read = match decoder.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(inflate_error(e)),
        };
        let requested = decompressed.len() + read;
        if requested > limit {
            return Err(LoadError::corrupt(format!(
                "{} section inflates past {} bytes",
                section.name(),
                limit
            )));
        }
        decompressed
            .try_reserve(read)
            .map_err(|_| LoadError::InsufficientMemory {
                table: section.name(),
                requested,
            })?;
        decompressed.extend_from_slice(&chunk[..read]);
    }

    Ok(decompressed)
}

#[cfg(not(feature = "compression"))]
fn decompress_section(section: Section, _data: &[u8]) -> Result<Vec<u8>, LoadError> {
    Err(LoadError::corrupt(format!(
        "{} section is compressed but compression support is disabled",
        section.name()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::format::writer::DataSetWriter;

    fn create_test_data(compress: bool) -> Vec<u8> {
        let mut writer = DataSetWriter::new().with_compression(compress);
        let browser = writer.add_component("Browser");
        let name = writer.add_property("BrowserName", browser).unwrap();
        let chrome = writer.add_value(name, "Chrome").unwrap();
        let profile = writer.add_profile(15364, browser, &[chrome]).unwrap();
        let nodes = writer.add_path(browser, &[(0, "Chrome/"), (7, "120")]).unwrap();
        writer.add_signature(&nodes, &[profile]).unwrap();
        writer.finalize().unwrap()
    }

    #[test]
    fn test_reader_from_slice() {
        let data = create_test_data(false);
        let reader = DataSetReader::from_slice(&data).unwrap();
        assert_eq!(reader.header().version, super::super::header::DATASET_VERSION);

        let parts = reader.read_parts().unwrap();
        assert_eq!(parts.components.len(), 1);
        assert_eq!(parts.nodes.len(), 2);
        assert_eq!(parts.root_nodes.len(), 1);
        assert_eq!(parts.signatures.len(), 1);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_compressed_and_plain_decode_identically() {
        let plain = create_test_data(false);
        let packed = create_test_data(true);
        assert_ne!(plain, packed);

        let plain_reader = DataSetReader::from_slice(&plain).unwrap();
        let packed_reader = DataSetReader::from_slice(&packed).unwrap();
        assert!(packed_reader.header().is_compressed(Section::Nodes));

        let a = plain_reader.read_parts().unwrap();
        let b = packed_reader.read_parts().unwrap();
        assert_eq!(a.strings, b.strings);
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.signatures, b.signatures);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_inflate_stops_at_limit() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&vec![0u8; 200_000]).unwrap();
        let packed = encoder.finish().unwrap();

        let err = inflate(Section::Strings, &packed, 150_000).err().unwrap();
        assert!(matches!(err, LoadError::CorruptData(_)));
        assert!(err.to_string().contains("inflates past 150000 bytes"));

        let inflated = inflate(Section::Strings, &packed, 200_000).unwrap();
        assert_eq!(inflated.len(), 200_000);
    }

    #[test]
    fn test_checksum_mismatch_is_corrupt() {
        let mut data = create_test_data(false);
        let last = data.len() - 1;
        data[last] ^= 0xff;

        let err = DataSetReader::from_slice(&data).err().unwrap();
        assert!(matches!(err, LoadError::CorruptData(_)));
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_truncated_file_is_corrupt() {
        let data = create_test_data(false);
        let err = DataSetReader::from_slice(&data[..data.len() - 3]).err().unwrap();
        assert!(matches!(err, LoadError::CorruptData(_)));
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let mut data = create_test_data(false);
        data[8..12].copy_from_slice(&2u32.to_le_bytes());

        let err = DataSetReader::from_slice(&data).err().unwrap();
        assert!(matches!(err, LoadError::IncorrectVersion(_)));
    }

    #[test]
    fn test_stats() {
        let data = create_test_data(false);
        let reader = DataSetReader::from_slice(&data).unwrap();

        let stats = reader.stats();
        assert_eq!(stats.header_size, DATASET_HEADER_SIZE);
        assert_eq!(stats.sections.len(), 8);
        assert_eq!(
            stats.header_size + stats.sections.iter().map(|s| s.stored_size).sum::<usize>(),
            stats.total_size
        );
    }
}
