pub mod dto;
pub mod loader;
pub mod ports;
pub mod provider;
pub mod use_cases;
pub mod workset;

pub use loader::{required_from_str, DataSetLoader};
pub use provider::DataSetProvider;
