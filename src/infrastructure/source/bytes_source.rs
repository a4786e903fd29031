use bytes::Bytes;

use crate::application::ports::DataSetSource;
use crate::domain::errors::LoadError;

/// Dataset already held in memory
#[derive(Debug, Clone)]
pub struct BytesSource {
    name: String,
    data: Bytes,
}

impl BytesSource {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

impl DataSetSource for BytesSource {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn read(&self) -> Result<Bytes, LoadError> {
        // Bytes clones share the buffer
        Ok(self.data.clone())
    }
}
