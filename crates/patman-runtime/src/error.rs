//! Error types for the runtime crate.

use patman_client::ClientError;
use patman_policy::PolicyError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of a lifecycle operation.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The desired configuration or the recorded expiry is unusable.
    /// Raised before any remote call.
    #[error(transparent)]
    Configuration(#[from] PolicyError),

    /// A present resource has no recorded expiry to classify.
    #[error("PAT {authorization_id} has no recorded valid_to")]
    MissingValidTo { authorization_id: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl LifecycleError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, LifecycleError::Configuration(_))
    }
}

/// Failures loading or saving resource state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),
}
