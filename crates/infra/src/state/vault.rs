//! Versioned secret store backend
//!
//! Implements [`StateStore`] against a KV version 2 HTTP API. Each key maps
//! to its own secret at `{mount}/data/{key}` holding `{"value": ...}`, and
//! every write creates a new secret version, so earlier refresh tokens stay
//! recoverable from the version history.

use async_trait::async_trait;
use chrono::Utc;
use decant_common::state::{StateError, StateStore, LAST_UPDATED_KEY};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::http::HttpClient;

/// State store backed by a KV v2 secret engine
pub struct VaultStateStore {
    addr: String,
    mount: String,
    token: String,
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct SecretEnvelope {
    data: VersionData,
}

#[derive(Debug, Deserialize)]
struct VersionData {
    data: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    value: Option<String>,
}

impl VaultStateStore {
    /// Connect to the secret store at `addr`, using keys below `mount`.
    ///
    /// # Errors
    /// Returns `StateError::Backend` if the HTTP transport cannot be built.
    pub fn new(addr: &str, mount: &str, token: &str) -> Result<Self, StateError> {
        let http = HttpClient::new()
            .map_err(|e| StateError::Backend(format!("secret store transport: {e}")))?;
        Ok(Self::with_http(addr, mount, token, http))
    }

    /// Connect using an existing transport.
    #[must_use]
    pub fn with_http(addr: &str, mount: &str, token: &str, http: HttpClient) -> Self {
        Self {
            addr: addr.trim_end_matches('/').to_string(),
            mount: mount.trim_matches('/').to_string(),
            token: token.to_string(),
            http,
        }
    }

    fn secret_url(&self, key: &str) -> String {
        format!("{}/v1/{}/data/{}", self.addr, self.mount, key)
    }

    async fn write_secret(&self, key: &str, value: &str) -> Result<(), StateError> {
        let request = self
            .http
            .request(Method::POST, self.secret_url(key))
            .header("X-Vault-Token", &self.token)
            .json(&json!({ "data": { "value": value } }));

        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| StateError::Backend(format!("secret write failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StateError::Backend(format!(
                "secret write for '{key}' returned HTTP {status}: {body}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl StateStore for VaultStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let request = self
            .http
            .request(Method::GET, self.secret_url(key))
            .header("X-Vault-Token", &self.token);

        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| StateError::Backend(format!("secret read failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StateError::Backend(format!(
                "secret read for '{key}' returned HTTP {status}: {body}"
            )));
        }

        let envelope: SecretEnvelope = response
            .json()
            .await
            .map_err(|e| StateError::Serialization(format!("secret payload for '{key}': {e}")))?;

        Ok(envelope.data.data.value)
    }

    /// Write a new version of the secret under `key`.
    ///
    /// The last-updated marker is stamped with a second write once the value
    /// itself is durable; a failed stamp is logged rather than propagated,
    /// since the value write has already succeeded.
    async fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        self.write_secret(key, value).await?;
        debug!(key, "Secret version written");

        if key != LAST_UPDATED_KEY {
            let stamp = Utc::now().to_rfc3339();
            if let Err(e) = self.write_secret(LAST_UPDATED_KEY, &stamp).await {
                warn!(error = %e, "Failed to stamp the last-updated marker");
            }
        }

        Ok(())
    }
}
