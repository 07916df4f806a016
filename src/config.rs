//! Codec configuration
//!
//! Loaded from a JSON file. Every key is optional:
//!
//! ```json
//! {
//!   "string_slot_bytes": 32,
//!   "max_depth": 64,
//!   "grow_lists": false,
//!   "log_level": "warn"
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::schema::{DEFAULT_MAX_DEPTH, DEFAULT_STRING_SLOT_BYTES};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Flat slot size for strings without declared capacity (default 32)
    #[serde(default = "default_string_slot_bytes")]
    pub string_slot_bytes: usize,

    /// Maximum schema nesting depth (default 64)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Whether decoders may append list slots beyond those pre-allocated
    #[serde(default)]
    pub grow_lists: bool,

    /// Minimum log severity: trace, info, warn, error or fatal
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_string_slot_bytes() -> usize {
    DEFAULT_STRING_SLOT_BYTES
}
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            string_slot_bytes: default_string_slot_bytes(),
            max_depth: default_max_depth(),
            grow_lists: false,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = Self::from_json_str(&content)?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", path.display().to_string().as_str())],
        );

        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.string_slot_bytes == 0 {
            return Err(ConfigError::Invalid(
                "string_slot_bytes must be > 0".to_string(),
            ));
        }

        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be > 0".to_string()));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "Invalid log_level: '{}'. Expected trace, info, warn, error or fatal.",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Minimum log severity
    pub fn log_severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Warn)
    }

    /// Applies the configured log level to the process-wide logger
    pub fn install_logging(&self) {
        Logger::set_min_severity(self.log_severity());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.string_slot_bytes, 32);
        assert_eq!(config.max_depth, 64);
        assert!(!config.grow_lists);
        assert_eq!(config.log_severity(), Severity::Warn);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_json_str(
            r#"{"string_slot_bytes": 64, "grow_lists": true, "log_level": "trace"}"#,
        )
        .unwrap();
        assert_eq!(config.string_slot_bytes, 64);
        assert!(config.grow_lists);
        assert_eq!(config.log_severity(), Severity::Trace);
    }

    #[test]
    fn test_zero_slot_rejected() {
        let result = Config::from_json_str(r#"{"string_slot_bytes": 0}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let result = Config::from_json_str(r#"{"max_depth": 0}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let result = Config::from_json_str(r#"{"log_level": "loud"}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_invalid_json() {
        let result = Config::from_json_str("{not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"max_depth": 8}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.max_depth, 8);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(&dir.path().join("ute.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
