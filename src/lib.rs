//! # Device Pattern - User-Agent device detection
//!
//! Identifies a device's hardware, browser and crawler properties from a
//! single User-Agent string by matching it against a precompiled corpus of
//! known device signatures.
//!
//! ## Architecture Layers
//!
//! - **Domain**: the immutable dataset tables (nodes, signatures, profiles,
//!   properties, values) and their value objects
//! - **Application**: matching, profile resolution, property projection,
//!   dataset loading and the shared provider
//! - **Infrastructure**: the binary dataset format (reader and writer) and
//!   dataset sources
//!
//! ## Matching
//!
//! Each component (hardware, browser, crawler, ...) owns a tree of character
//! ranges. The input is walked through every tree; signatures reached through
//! matched nodes become candidates. A candidate is chosen per component by
//! exact match, then by numeric distance, then by closest character match.
//!
//! ## Example Usage
//!
//! ```no_run
//! use device_pattern::{detect, load};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dataset = load("data/devices.dpd", &["IsMobile", "BrowserName"])?;
//! let result = detect(&dataset, "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)");
//! println!("{} {:?}", result.device_id, result.property("IsMobile"));
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

use std::path::Path;

// Re-export key types explicitly to avoid ambiguity
pub use application::dto::{
    ComponentMatch, Match, MatchMetrics, MatchResult, ProfileSet, ProjectedProperty, Projection,
};
pub use application::use_cases::{
    detect, match_user_agent, project_properties, resolve_profiles, DetectDeviceUseCase,
};
pub use application::{dto, ports, required_from_str, DataSetLoader, DataSetProvider};
pub use config::{Config, ConfigError};
pub use domain::errors::LoadError;
pub use domain::{entities, value_objects, DataSet};
pub use infrastructure::{DataSetWriter, WriteError};
pub use value_objects::{MatchMethod, PropertyValue};

/// Load a dataset file, projecting `required` properties in that order.
///
/// An empty list projects every property in dataset order.
pub fn load<S: AsRef<str>>(path: impl AsRef<Path>, required: &[S]) -> Result<DataSet, LoadError> {
    loader_for(required).load(path)
}

/// Load a dataset already held in memory
pub fn load_from_bytes<S: AsRef<str>>(data: &[u8], required: &[S]) -> Result<DataSet, LoadError> {
    loader_for(required).load_from_bytes(data)
}

fn loader_for<S: AsRef<str>>(required: &[S]) -> DataSetLoader {
    DataSetLoader::new().with_required_properties(required.iter().map(|s| s.as_ref()))
}
