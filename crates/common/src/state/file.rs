//! File-backed state store

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{StateError, StateStore, LAST_UPDATED_KEY};

/// State store backed by a JSON file on the local filesystem
///
/// The whole state is held in memory and rewritten on every `set`. Writes go
/// to a sibling temp file first and are renamed into place, so a crash
/// mid-write never leaves a truncated state file behind.
pub struct FileStateStore {
    path: PathBuf,
    state: Mutex<BTreeMap<String, String>>,
}

impl FileStateStore {
    /// Open a file-backed store, loading any existing state
    ///
    /// A missing file starts from empty state. A file that exists but does
    /// not parse as a JSON object is also treated as empty rather than
    /// aborting the run; the next `set` rewrites it wholesale.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref().to_path_buf();

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, String>>(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "State file is not valid JSON, starting from empty state");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No state file found, starting from empty state");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, state: Mutex::new(state) })
    }

    async fn persist(&self, state: &BTreeMap<String, String>) -> Result<(), StateError> {
        let payload = serde_json::to_vec_pretty(state)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &payload).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.state.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        let mut state = self.state.lock().await;
        state.insert(key.to_string(), value.to_string());
        state.insert(LAST_UPDATED_KEY.to_string(), Utc::now().to_rfc3339());
        self.persist(&state).await
    }
}
