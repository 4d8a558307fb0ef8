//! Engine configuration.
//!
//! Loaded from a camelCase JSON file; every field has a default, so an empty
//! object (or no file at all) gives the stock engine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::validation::ValidationPolicy;
use crate::impls::DEFAULT_BATCH_LIMIT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Maximum writes per store commit
    pub batch_write_limit: usize,

    /// OOO periods longer than this many days need a message
    pub ooo_message_threshold_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_write_limit: DEFAULT_BATCH_LIMIT,
            ooo_message_threshold_days: ValidationPolicy::default().ooo_message_threshold_days,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: origin.clone(),
                source,
            })?;
        Self::from_json(&text, &origin)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_write_limit == 0 {
            return Err(ConfigError::Invalid(
                "batchWriteLimit must be at least 1".into(),
            ));
        }
        if self.ooo_message_threshold_days < 0 {
            return Err(ConfigError::Invalid(
                "oooMessageThresholdDays must not be negative".into(),
            ));
        }
        Ok(())
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            ooo_message_threshold_days: self.ooo_message_threshold_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = EngineConfig::from_json("{}", "inline").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.batch_write_limit, 500);
        assert_eq!(config.ooo_message_threshold_days, 3);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json(r#"{ "batchWriteLimit": 50 }"#, "inline").unwrap();
        assert_eq!(config.batch_write_limit, 50);
        assert_eq!(config.validation_policy(), ValidationPolicy::default());
    }

    #[test]
    fn test_rejects_zero_batch_limit() {
        let err = EngineConfig::from_json(r#"{ "batchWriteLimit": 0 }"#, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = EngineConfig::from_json("[", "rollcall.json").unwrap_err();
        assert!(err.to_string().contains("rollcall.json"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/rollcall.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
