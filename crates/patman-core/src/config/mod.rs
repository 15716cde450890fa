//! Configuration types for patman.
//!
//! A single YAML file describes both the remote service connection
//! (`provider`) and the desired state of the managed token (`pat`):
//!
//! ```yaml
//! provider:
//!   organization: contoso
//!   api_version: 7.2-preview.1
//! pat:
//!   display_name: ci-token
//!   expiration_days: 90
//!   renew_before_days: 7
//! ```
//!
//! Renewal-window consistency (`renew_before_days < expiration_days`) is not
//! checked here; it is a lifecycle precondition enforced before every
//! issuance and read-driven renewal decision.

pub mod pat;
pub mod provider;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use pat::PatConfig;
pub use provider::{AuthConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL, ProviderConfig};

/// Complete patman configuration loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatmanConfig {
    /// Remote service connection.
    pub provider: ProviderConfig,

    /// Desired token state.
    pub pat: PatConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PatmanConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields that have no sensible fallback.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.organization.trim().is_empty() {
            return Err(ConfigError::Config(
                "provider.organization must not be empty".to_string(),
            ));
        }
        if self.provider.fetch_attempts == 0 {
            return Err(ConfigError::Config(
                "provider.fetch_attempts must be at least 1".to_string(),
            ));
        }
        if self.pat.display_name.trim().is_empty() {
            return Err(ConfigError::Config(
                "pat.display_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
