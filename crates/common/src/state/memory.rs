//! In-memory state store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{StateError, StateStore, LAST_UPDATED_KEY};

/// State store backed by an in-memory map
///
/// Nothing survives the process; used in tests and for runs that opt out of
/// durable state entirely.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let state = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { state: Mutex::new(state) }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.state.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        let mut state = self.state.lock();
        state.insert(key.to_string(), value.to_string());
        state.insert(LAST_UPDATED_KEY.to_string(), Utc::now().to_rfc3339());
        Ok(())
    }
}
