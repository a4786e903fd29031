pub mod format;
pub mod source;

pub use format::{DataSetReader, DataSetWriter, WriteError};
pub use source::{BytesSource, FileSource};
