mod bytes_source;
mod file_source;

pub use bytes_source::BytesSource;
pub use file_source::FileSource;
