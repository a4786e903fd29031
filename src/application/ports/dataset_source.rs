use bytes::Bytes;

use crate::domain::errors::LoadError;

/// Where dataset bytes come from.
///
/// The loader only ever sees complete files; partial reads are the source's
/// problem and surface as [`LoadError`].
pub trait DataSetSource: Send + Sync {
    /// Human readable origin, used in logs
    fn describe(&self) -> String;

    /// Read the complete dataset file
    fn read(&self) -> Result<Bytes, LoadError>;
}

#[cfg(test)]
mockall::mock! {
    pub DataSetSource {}

    impl DataSetSource for DataSetSource {
        fn describe(&self) -> String;
        fn read(&self) -> Result<Bytes, LoadError>;
    }
}
