//! Shared dataset handle with atomic reload

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::application::loader::DataSetLoader;
use crate::application::ports::DataSetSource;
use crate::domain::errors::LoadError;
use crate::domain::DataSet;

/// Holds the active dataset for concurrent readers.
///
/// Readers take a cheap `Arc` snapshot and keep it for the whole match, so a
/// reload never disturbs a match already in progress.
pub struct DataSetProvider {
    loader: DataSetLoader,
    source: Arc<dyn DataSetSource>,
    current: RwLock<Arc<DataSet>>,
    generation: AtomicU64,
}

impl DataSetProvider {
    /// Load the initial dataset from `source`
    pub fn new(loader: DataSetLoader, source: Arc<dyn DataSetSource>) -> Result<Self, LoadError> {
        let dataset = loader.load_from_source(source.as_ref())?;
        Ok(Self {
            loader,
            source,
            current: RwLock::new(Arc::new(dataset)),
            generation: AtomicU64::new(1),
        })
    }

    /// Snapshot of the active dataset
    pub fn current(&self) -> Arc<DataSet> {
        self.current.read().clone()
    }

    /// Number of datasets installed so far, starting at 1
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Build a fresh dataset from the source and swap it in.
    ///
    /// The new dataset is assembled without holding the lock. On failure the
    /// active dataset stays in place and the error is returned.
    pub fn reload(&self) -> Result<Arc<DataSet>, LoadError> {
        let dataset = match self.loader.load_from_source(self.source.as_ref()) {
            Ok(dataset) => Arc::new(dataset),
            Err(e) => {
                warn!(
                    source = %self.source.describe(),
                    error = %e,
                    "dataset reload failed, keeping current dataset"
                );
                return Err(e);
            }
        };

        *self.current.write() = Arc::clone(&dataset);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(
            generation,
            checksum = %dataset.checksum(),
            "dataset reloaded"
        );
        Ok(dataset)
    }
}
