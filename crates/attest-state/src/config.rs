//! # Engine Configuration
//!
//! Loaded from YAML (JSON parses too, as a YAML subset). Every field has a
//! default, so an empty document is a valid configuration.
//!
//! ```yaml
//! domain_name: attest
//! domain_version: "1"
//! engine_id: attest-local
//! max_batch_size: 256
//! ```
//!
//! The three `domain_*`/`engine_id` fields form the delegation domain
//! separator: a signature made for one engine never verifies on another.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or validating an [`EngineConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML for this structure.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A field value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Delegation domain name.
    pub domain_name: String,
    /// Delegation domain version.
    pub domain_version: String,
    /// Identifier of this engine instance within the domain.
    pub engine_id: String,
    /// Largest batch accepted by `attest_batch` / `revoke_batch`.
    pub max_batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            domain_name: "attest".to_string(),
            domain_version: "1".to_string(),
            engine_id: "attest-local".to_string(),
            max_batch_size: 256,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a YAML (or JSON) document.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = if s.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(s)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::Invalid("max_batch_size must be at least 1".to_string()));
        }
        for (name, value) in [
            ("domain_name", &self.domain_name),
            ("domain_version", &self.domain_version),
            ("engine_id", &self.engine_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}
