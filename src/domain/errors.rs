use std::path::PathBuf;

use thiserror::Error;

/// Reasons a dataset could not be constructed.
///
/// Loading is all-or-nothing: any of these means no dataset was produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Insufficient memory to allocate the {table} table ({requested} entries)")]
    InsufficientMemory {
        table: &'static str,
        requested: usize,
    },

    #[error("Device data file is corrupted: {0}")]
    CorruptData(String),

    #[error("Device data file is not correct: {0}")]
    IncorrectVersion(String),

    #[error("Device data file not found: {path}: {reason}")]
    FileNotFound { path: PathBuf, reason: String },

    #[error("Unknown property requested: {0}")]
    UnknownProperty(String),
}

impl LoadError {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        LoadError::CorruptData(message.into())
    }
}
