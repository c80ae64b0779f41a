//! Token manager for the refresh token grant lifecycle
//!
//! Manages OAuth token lifecycle:
//! - Refresh token loaded from the state store at startup
//! - Access token held in memory only, never persisted
//! - Rotated refresh tokens persisted before the new access token is
//!   published
//! - Rejection-driven refresh, serialized so concurrent 401s trigger a
//!   single grant

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::client::OAuthClientError;
use super::traits::TokenEndpoint;
use crate::state::{StateError, StateStore};

/// Error type for token manager operations
#[derive(Debug)]
pub enum TokenManagerError {
    /// State store operation failed
    StateError(StateError),

    /// OAuth operation failed
    OAuthError(OAuthClientError),

    /// No refresh token stored under the configured key
    MissingRefreshToken { key: String },

    /// No session established (initialize not called or failed)
    NotAuthenticated,
}

impl std::fmt::Display for TokenManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StateError(e) => write!(f, "State store error: {e}"),
            Self::OAuthError(e) => write!(f, "OAuth error: {e}"),
            Self::MissingRefreshToken { key } => {
                write!(
                    f,
                    "No refresh token stored under '{key}'; run the authorize flow to seed it"
                )
            }
            Self::NotAuthenticated => write!(f, "Not authenticated (no session)"),
        }
    }
}

impl std::error::Error for TokenManagerError {}

impl From<OAuthClientError> for TokenManagerError {
    fn from(err: OAuthClientError) -> Self {
        Self::OAuthError(err)
    }
}

impl From<StateError> for TokenManagerError {
    fn from(err: StateError) -> Self {
        Self::StateError(err)
    }
}

/// Access token snapshot handed to API callers
///
/// The generation identifies which grant produced the token. A caller that
/// gets a 401 reports the generation it used, so the manager can tell a
/// stale rejection from a fresh one.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub generation: u64,
}

#[derive(Debug)]
struct Session {
    access_token: String,
    refresh_token: String,
    generation: u64,
}

/// Token manager for rejection-driven refresh
///
/// Manages the full token lifecycle:
/// 1. Loads the refresh token from the state store at startup
/// 2. Obtains an access token via the refresh token grant
/// 3. Persists rotated refresh tokens before publishing the new access token
/// 4. Serializes refreshes so a burst of 401s produces one grant
pub struct TokenManager<C: TokenEndpoint + 'static> {
    endpoint: Arc<C>,
    store: Arc<dyn StateStore>,
    state_key: String,
    session: RwLock<Option<Session>>,
    refresh_gate: Mutex<()>,
}

impl<C: TokenEndpoint + 'static> TokenManager<C> {
    /// Create a new token manager
    ///
    /// # Arguments
    /// * `endpoint` - Token endpoint client for the refresh grant
    /// * `store` - State store holding the persisted refresh token
    /// * `state_key` - Key the refresh token is stored under
    #[must_use]
    pub fn new(endpoint: C, store: Arc<dyn StateStore>, state_key: String) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            store,
            state_key,
            session: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Initialize by loading the refresh token and obtaining an access token
    ///
    /// Must be called before any extraction work starts. A missing refresh
    /// token is a configuration problem, not a transient one: the run cannot
    /// proceed and the operator has to seed the store via the authorize flow.
    ///
    /// # Errors
    /// Returns error if no refresh token is stored, the grant is rejected,
    /// or persisting a rotated refresh token fails
    pub async fn initialize(&self) -> Result<(), TokenManagerError> {
        let _gate = self.refresh_gate.lock().await;
        self.load_and_grant().await?;
        info!("Token manager initialized, access token obtained");
        Ok(())
    }

    /// Get the current access token, establishing a session on first use
    ///
    /// The fast path is a read lock and a clone. If no session exists yet
    /// the manager performs the startup grant here, double-checked under the
    /// refresh gate so concurrent first callers produce one grant.
    ///
    /// # Errors
    /// Returns error if no refresh token is stored or the grant fails
    pub async fn access_token(&self) -> Result<AccessToken, TokenManagerError> {
        if let Some(access) = self.current_access().await {
            return Ok(access);
        }

        let _gate = self.refresh_gate.lock().await;
        if let Some(access) = self.current_access().await {
            return Ok(access);
        }
        self.load_and_grant().await
    }

    /// Refresh the session after an API rejection of the given generation
    ///
    /// Callers pass the generation of the token the API rejected. Refreshes
    /// are serialized: when several workers hit 401 on the same generation,
    /// the first one performs the grant and the rest get the new token
    /// without a second round trip.
    ///
    /// # Errors
    /// Returns error if the grant is rejected (the refresh token itself is
    /// invalid) or persisting the rotation fails
    pub async fn refresh_after_rejection(
        &self,
        observed_generation: u64,
    ) -> Result<AccessToken, TokenManagerError> {
        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while this one waited on the gate.
        let (refresh_token, next_generation) = {
            let session = self.session.read().await;
            let current = session.as_ref().ok_or(TokenManagerError::NotAuthenticated)?;
            if current.generation != observed_generation {
                debug!(
                    generation = current.generation,
                    "Rejection was for a stale token, reusing current grant"
                );
                return Ok(AccessToken {
                    token: current.access_token.clone(),
                    generation: current.generation,
                });
            }
            (current.refresh_token.clone(), current.generation + 1)
        };

        warn!(generation = observed_generation, "Access token rejected, requesting a new grant");
        self.grant_and_publish(refresh_token, next_generation).await
    }

    /// Check whether a session is established
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Get the state store key the refresh token lives under
    #[must_use]
    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    async fn current_access(&self) -> Option<AccessToken> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| AccessToken { token: s.access_token.clone(), generation: s.generation })
    }

    /// Load the stored refresh token and perform a grant
    ///
    /// Callers must hold the refresh gate.
    async fn load_and_grant(&self) -> Result<AccessToken, TokenManagerError> {
        let stored = self.store.get(&self.state_key).await?;
        let refresh_token = stored
            .ok_or_else(|| TokenManagerError::MissingRefreshToken { key: self.state_key.clone() })?;

        let next_generation = self.session.read().await.as_ref().map_or(1, |s| s.generation + 1);
        self.grant_and_publish(refresh_token, next_generation).await
    }

    /// Perform the grant and publish the resulting session
    ///
    /// The rotated refresh token is persisted before the session is updated.
    /// If persistence fails the old session stays in place and the error
    /// propagates: an unpersisted rotation would strand the next run with a
    /// refresh token the provider has already invalidated.
    async fn grant_and_publish(
        &self,
        refresh_token: String,
        next_generation: u64,
    ) -> Result<AccessToken, TokenManagerError> {
        let response = self.endpoint.refresh_access_token(&refresh_token).await?;

        let refresh_token = match response.refresh_token {
            Some(rotated) => {
                self.store.set(&self.state_key, &rotated).await?;
                debug!("Rotated refresh token persisted");
                rotated
            }
            None => refresh_token,
        };

        let access =
            AccessToken { token: response.access_token.clone(), generation: next_generation };
        *self.session.write().await = Some(Session {
            access_token: response.access_token,
            refresh_token,
            generation: next_generation,
        });

        Ok(access)
    }
}
