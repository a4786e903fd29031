use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::application::ports::DataSetSource;
use crate::config::Config;
use crate::domain::errors::LoadError;
use crate::domain::{DataSet, DEFAULT_MAX_SCAN_LENGTH};
use crate::infrastructure::format::DataSetReader;
use crate::infrastructure::source::FileSource;

/// Split a comma separated property list, dropping blank entries
pub fn required_from_str(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Options for turning dataset bytes into a [`DataSet`]
#[derive(Debug, Clone)]
pub struct DataSetLoader {
    required: Vec<String>,
    max_scan_length: usize,
}

impl DataSetLoader {
    /// Project every property and scan the default input length
    pub fn new() -> Self {
        Self {
            required: Vec::new(),
            max_scan_length: DEFAULT_MAX_SCAN_LENGTH,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_required_properties(config.required_properties.iter().cloned())
            .with_max_scan_length(config.max_scan_length)
    }

    /// Properties to project, in output order. Empty means all of them.
    pub fn with_required_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    /// Input bytes considered per match; zero is raised to one
    pub fn with_max_scan_length(mut self, max_scan_length: usize) -> Self {
        self.max_scan_length = max_scan_length.max(1);
        self
    }

    pub fn required_properties(&self) -> &[String] {
        &self.required
    }

    pub fn max_scan_length(&self) -> usize {
        self.max_scan_length
    }

    /// Load a dataset file from disk
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataSet, LoadError> {
        self.load_from_source(&FileSource::new(path.as_ref()))
    }

    pub fn load_from_source(&self, source: &dyn DataSetSource) -> Result<DataSet, LoadError> {
        let data = source.read()?;
        let dataset = self.load_from_bytes(&data)?;
        info!(source = %source.describe(), "dataset source loaded");
        Ok(dataset)
    }

    /// Parse, verify and assemble a dataset held in memory
    pub fn load_from_bytes(&self, data: &[u8]) -> Result<DataSet, LoadError> {
        let start = Instant::now();
        let reader = DataSetReader::from_slice(data)?;
        let parts = reader.read_parts()?;
        let dataset = DataSet::assemble(parts, &self.required, self.max_scan_length)?;

        let stats = dataset.stats();
        info!(
            checksum = %dataset.checksum(),
            components = stats.components,
            properties = stats.properties,
            profiles = stats.profiles,
            signatures = stats.signatures,
            nodes = stats.nodes,
            required = stats.required_properties,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "dataset loaded"
        );
        Ok(dataset)
    }
}

impl Default for DataSetLoader {
    fn default() -> Self {
        Self::new()
    }
}
