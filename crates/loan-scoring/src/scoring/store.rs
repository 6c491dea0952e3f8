use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::model::ModelArtifact;

/// Failure to read or write the model artifact or the decision history.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("model artifact {} is not readable: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode model artifact: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid application history in {}: {source}", .path.display())]
    History { path: PathBuf, source: csv::Error },
    #[error("model store unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of the active scoring strategy.
pub trait ModelStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<ModelArtifact>, StorageError>;
    fn save(&self, artifact: &ModelArtifact) -> Result<(), StorageError>;
}

/// JSON artifact on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ModelStore for FileModelStore {
    fn load(&self) -> Result<Option<ModelArtifact>, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let artifact = serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(artifact))
    }

    fn save(&self, artifact: &ModelArtifact) -> Result<(), StorageError> {
        let payload = serde_json::to_vec(artifact).map_err(StorageError::Encode)?;
        let write_err = |source: std::io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        // Readers never observe a half-written artifact.
        let staging = self.staging_path();
        std::fs::write(&staging, payload).map_err(write_err)?;
        std::fs::rename(&staging, &self.path).map_err(write_err)?;

        debug!(path = %self.path.display(), "model artifact written");
        Ok(())
    }
}

/// Process-local store for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryModelStore {
    artifact: Mutex<Option<ModelArtifact>>,
}

impl InMemoryModelStore {
    pub fn with_artifact(artifact: ModelArtifact) -> Self {
        Self {
            artifact: Mutex::new(Some(artifact)),
        }
    }

    pub fn snapshot(&self) -> Option<ModelArtifact> {
        self.artifact
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ModelStore for InMemoryModelStore {
    fn load(&self) -> Result<Option<ModelArtifact>, StorageError> {
        let guard = self
            .artifact
            .lock()
            .map_err(|_| StorageError::Unavailable("model store lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, artifact: &ModelArtifact) -> Result<(), StorageError> {
        let mut guard = self
            .artifact
            .lock()
            .map_err(|_| StorageError::Unavailable("model store lock poisoned".to_string()))?;
        *guard = Some(artifact.clone());
        Ok(())
    }
}
