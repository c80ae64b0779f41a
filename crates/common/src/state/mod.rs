//! Durable key-value state persistence
//!
//! Extraction runs need a small amount of state to survive between
//! executions, most importantly the current OAuth refresh token, which
//! rotates on every use. The [`StateStore`] trait abstracts that persistence
//! behind a minimal get/set capability so callers never know, or depend on,
//! which backend holds the data.
//!
//! Backends provided here:
//! - [`FileStateStore`]: a JSON file on the local filesystem
//! - [`MemoryStateStore`]: in-memory map, used in tests and as a null backend
//!
//! A versioned secret store backend lives in the infra crate.

mod file;
mod memory;

use async_trait::async_trait;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

/// Key stamped with the current UTC timestamp on every write
pub const LAST_UPDATED_KEY: &str = "last_updated_at";

/// Error type for state store operations
#[derive(Debug)]
pub enum StateError {
    /// Filesystem access failed
    Io(String),

    /// Stored payload could not be encoded or decoded
    Serialization(String),

    /// Remote backend rejected or failed the operation
    Backend(String),
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "State I/O error: {e}"),
            Self::Serialization(e) => write!(f, "State serialization error: {e}"),
            Self::Backend(e) => write!(f, "State backend error: {e}"),
        }
    }
}

impl std::error::Error for StateError {}

impl From<std::io::Error> for StateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Trait for durable key-value state persistence
///
/// Implementations must stamp [`LAST_UPDATED_KEY`] with the current UTC
/// timestamp on every successful `set`, and must make `set` durable before
/// returning: a caller that observes `Ok` may assume the value survives a
/// process restart.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Retrieve the value stored under `key`
    ///
    /// # Errors
    /// Returns error if the backend cannot be read. A missing key is not an
    /// error; it yields `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<String>, StateError>;

    /// Store `value` under `key`
    ///
    /// # Errors
    /// Returns error if the value could not be made durable.
    async fn set(&self, key: &str, value: &str) -> Result<(), StateError>;
}
