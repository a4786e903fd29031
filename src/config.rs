use std::path::PathBuf;

use thiserror::Error;

use crate::application::loader::required_from_str;
use crate::domain::DEFAULT_MAX_SCAN_LENGTH;

/// Upper bound accepted for `MAX_SCAN_LENGTH`; node positions are 16-bit
pub const MAX_SCAN_LENGTH_LIMIT: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("DATASET_PATH cannot be empty")]
    MissingDatasetPath,

    #[error("MAX_SCAN_LENGTH must be between 1 and 65535, got {0}")]
    InvalidScanLength(usize),

    #[error("REQUIRED_PROPERTIES lists {0} more than once")]
    DuplicateProperty(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub dataset_path: PathBuf,
    /// Properties to project, in output order; empty means all
    pub required_properties: Vec<String>,
    pub max_scan_length: usize,
    /// Emit JSON log lines instead of human readable ones
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/devices.dpd"),
            required_properties: Vec::new(),
            max_scan_length: DEFAULT_MAX_SCAN_LENGTH,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            dataset_path: lookup("DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.dataset_path),
            required_properties: lookup("REQUIRED_PROPERTIES")
                .map(|s| required_from_str(&s))
                .unwrap_or_default(),
            max_scan_length: lookup("MAX_SCAN_LENGTH")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_scan_length),
            log_json: lookup("LOG_FORMAT")
                .map(|s| s.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingDatasetPath);
        }

        if self.max_scan_length == 0 || self.max_scan_length > MAX_SCAN_LENGTH_LIMIT {
            return Err(ConfigError::InvalidScanLength(self.max_scan_length));
        }

        for (i, name) in self.required_properties.iter().enumerate() {
            if self.required_properties[..i].contains(name) {
                return Err(ConfigError::DuplicateProperty(name.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reads_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATASET_PATH", "/srv/devices.dpd"),
            ("REQUIRED_PROPERTIES", "IsMobile, BrowserName"),
            ("MAX_SCAN_LENGTH", "256"),
            ("LOG_FORMAT", "JSON"),
        ]));

        assert_eq!(config.dataset_path, PathBuf::from("/srv/devices.dpd"));
        assert_eq!(config.required_properties, vec!["IsMobile", "BrowserName"]);
        assert_eq!(config.max_scan_length, 256);
        assert!(config.log_json);
    }

    #[test]
    fn test_unparsable_scan_length_uses_default() {
        let config = Config::from_lookup(lookup_from(&[("MAX_SCAN_LENGTH", "lots")]));
        assert_eq!(config.max_scan_length, DEFAULT_MAX_SCAN_LENGTH);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            max_scan_length: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidScanLength(0)));

        let config = Config {
            dataset_path: PathBuf::new(),
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingDatasetPath));

        let config = Config {
            required_properties: vec!["IsMobile".into(), "IsMobile".into()],
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateProperty(_))
        ));
    }
}
