//! Integration tests for state module
//!
//! Tests file-backed state persistence across process boundaries and its
//! interaction with the token lifecycle.

use std::sync::Arc;

use decant_common::auth::{TokenManager, TokenManagerError};
use decant_common::state::{FileStateStore, StateStore, LAST_UPDATED_KEY};
use decant_common::testing::MockTokenEndpoint;

const STATE_KEY: &str = "extractor_refresh_token";

/// Validates that state written through one store handle is visible through
/// a fresh handle on the same file.
///
/// # Test Steps
/// 1. Open a store on a fresh path and write two keys
/// 2. Drop the store and reopen the same path
/// 3. Verify both keys and the update stamp survived
#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");

    {
        let store = FileStateStore::open(&path).await.expect("open");
        store.set(STATE_KEY, "R1").await.expect("set");
        store.set("orders_cursor", "2024-05-01").await.expect("set");
    }

    let reopened = FileStateStore::open(&path).await.expect("reopen");
    assert_eq!(reopened.get(STATE_KEY).await.expect("get"), Some("R1".to_string()));
    assert_eq!(
        reopened.get("orders_cursor").await.expect("get"),
        Some("2024-05-01".to_string())
    );

    let stamp = reopened
        .get(LAST_UPDATED_KEY)
        .await
        .expect("get stamp")
        .expect("stamp should be written");
    chrono::DateTime::parse_from_rfc3339(&stamp).expect("stamp should be RFC 3339");
}

/// Validates that refresh token rotation survives a process restart.
///
/// A run that rotates the refresh token and then exits must leave the new
/// token on disk, or the next run would present a token the provider has
/// already invalidated.
///
/// # Test Steps
/// 1. Seed a file store with `R1` and initialize a manager whose grant
///    rotates to `R2`
/// 2. Drop everything, reopen the file, and initialize a second manager
/// 3. Verify the second manager's grant presented `R2`, not `R1`
#[tokio::test]
async fn test_rotation_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");

    {
        let store = FileStateStore::open(&path).await.expect("open");
        store.set(STATE_KEY, "R1").await.expect("seed");

        let endpoint = MockTokenEndpoint::new();
        endpoint.push_success("A1", Some("R2"));
        let manager = TokenManager::new(endpoint, Arc::new(store), STATE_KEY.to_string());
        manager.initialize().await.expect("first run initialize");
    }

    let store = Arc::new(FileStateStore::open(&path).await.expect("reopen"));
    let endpoint = MockTokenEndpoint::new();
    endpoint.push_success("A2", Some("R3"));
    let seen = endpoint.refresh_tokens_seen();
    let manager = TokenManager::new(endpoint, store.clone(), STATE_KEY.to_string());

    manager.initialize().await.expect("second run initialize");

    assert_eq!(*seen.lock(), vec!["R2".to_string()]);
    assert_eq!(store.get(STATE_KEY).await.expect("get"), Some("R3".to_string()));
}

/// Validates the startup failure when no refresh token has ever been seeded.
///
/// # Test Steps
/// 1. Open a store on a path that does not exist yet
/// 2. Initialize a manager against it
/// 3. Verify the missing token surfaces as a configuration problem naming
///    the key
#[tokio::test]
async fn test_unseeded_store_fails_initialization() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");

    let store = FileStateStore::open(&path).await.expect("open");
    let endpoint = MockTokenEndpoint::new();
    let manager = TokenManager::new(endpoint, Arc::new(store), STATE_KEY.to_string());

    let result = manager.initialize().await;

    match result {
        Err(TokenManagerError::MissingRefreshToken { key }) => assert_eq!(key, STATE_KEY),
        other => panic!("expected MissingRefreshToken, got {other:?}"),
    }
}
