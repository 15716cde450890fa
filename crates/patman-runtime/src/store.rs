//! Persistence of [`ResourceState`] between invocations.

use crate::error::StoreError;
use patman_core::ResourceState;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Loads and saves the state of the one managed resource.
pub trait ResourceStateStore: Send + Sync {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<ResourceState>, StoreError>;

    fn save(&self, state: &ResourceState) -> Result<(), StoreError>;
}

/// State kept as a pretty-printed JSON file.
///
/// The file holds the token secret. It is replaced atomically and, on Unix,
/// is readable by the owner only.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResourceStateStore for FileStateStore {
    fn load(&self) -> Result<Option<ResourceState>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No state file yet");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, state: &ResourceState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state).map_err(StoreError::Encode)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        // NamedTempFile is created 0600 on Unix.
        let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        writeln!(file, "{json}").map_err(|e| self.io_error(e))?;
        file.as_file().sync_all().map_err(|e| self.io_error(e))?;
        file.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), "Saved state");
        Ok(())
    }
}

/// In-process store for tests and embedding hosts.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<ResourceState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ResourceState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl ResourceStateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<ResourceState>, StoreError> {
        let guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, state: &ResourceState) -> Result<(), StoreError> {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(state.clone());
        Ok(())
    }
}
