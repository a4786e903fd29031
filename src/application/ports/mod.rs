mod dataset_source;

pub use dataset_source::DataSetSource;

#[cfg(test)]
pub use dataset_source::MockDataSetSource;
