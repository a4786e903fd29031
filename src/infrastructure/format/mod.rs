//! Binary dataset file format
//!
//! A fixed 80-byte header followed by eight sections. See [`header`] for the
//! header layout and [`sections`] for the table encodings.

pub mod checksum;
pub mod header;
pub mod reader;
pub mod sections;
pub mod writer;

pub use checksum::SectionHasher;
pub use header::{DatasetHeader, Section, DATASET_HEADER_SIZE, DATASET_MAGIC, DATASET_VERSION};
pub use reader::{DataSetReader, SectionStat, SectionStats};
pub use writer::{DataSetWriter, WriteError};
