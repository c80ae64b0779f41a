//! Artifact storage

use std::path::PathBuf;

use async_trait::async_trait;
use decant_domain::{ExtractionError, Result};
use tracing::debug;

/// Sink for finished report artifacts
///
/// `put` is a whole-object write: implementations create any missing parent
/// location and replace an existing artifact of the same name.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under the relative artifact `name`.
    ///
    /// # Errors
    /// Returns `ExtractionError::State` if the artifact cannot be made
    /// durable.
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Artifact store rooted at a local directory
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute path an artifact name resolves to.
    #[must_use]
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl ArtifactStore for LocalDirStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let target = self.resolve(name);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ExtractionError::State(format!(
                    "creating artifact directory {} failed: {e}",
                    parent.display()
                ))
            })?;
        }

        tokio::fs::write(&target, bytes).await.map_err(|e| {
            ExtractionError::State(format!("writing artifact {} failed: {e}", target.display()))
        })?;

        debug!(path = %target.display(), bytes = bytes.len(), "Artifact written");
        Ok(())
    }
}
