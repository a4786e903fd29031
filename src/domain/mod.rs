pub mod dataset;
pub mod entities;
pub mod errors;
pub mod value_objects;

pub use dataset::{DataSet, DataSetParts, DataSetStats, DEFAULT_MAX_SCAN_LENGTH};
