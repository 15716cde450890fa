//! Configuration and state shared by every command.

use anyhow::{Context, Result};
use patman_core::{PatmanConfig, ResourceState};
use patman_runtime::{FileStateStore, ResourceStateStore};
use std::path::Path;

/// A loaded configuration plus the store for its state.
pub struct Session {
    pub config: PatmanConfig,
    pub store: FileStateStore,
}

impl Session {
    pub fn open(config_path: &Path, state_path: &Path) -> Result<Self> {
        let config = PatmanConfig::from_file(config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?;
        tracing::debug!(
            config = %config_path.display(),
            state = %state_path.display(),
            organization = %config.provider.organization,
            "Loaded configuration"
        );
        Ok(Self {
            config,
            store: FileStateStore::new(state_path),
        })
    }

    /// The persisted state, or an empty (absent) one on first run.
    pub fn load_state(&self) -> Result<ResourceState> {
        let state = self
            .store
            .load()
            .with_context(|| format!("failed to load state from {}", self.store.path().display()))?;
        Ok(state.unwrap_or_default())
    }

    pub fn save_state(&self, state: &ResourceState) -> Result<()> {
        self.store
            .save(state)
            .with_context(|| format!("failed to save state to {}", self.store.path().display()))
    }
}
