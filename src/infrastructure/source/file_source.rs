use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::application::ports::DataSetSource;
use crate::domain::errors::LoadError;

/// Dataset file on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSetSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<Bytes, LoadError> {
        let data = std::fs::read(&self.path).map_err(|e| LoadError::FileNotFound {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        debug!(path = %self.path.display(), size = data.len(), "read dataset file");
        Ok(Bytes::from(data))
    }
}
