//! OAuth 2.0 token endpoint client
//!
//! Handles the refresh token grant against the provider's token endpoint,
//! including:
//! - Refresh token grant with HTTP Basic client authentication
//! - One-time authorization code exchange for initial setup
//! - OAuth error response parsing

use async_trait::async_trait;
use reqwest::Client;

use super::traits::TokenEndpoint;
use super::types::{OAuthConfig, OAuthErrorBody, TokenResponse};

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// OAuth server rejected the grant
    Rejected(OAuthErrorBody),

    /// Failed to parse response
    ParseError(String),

    /// No refresh token available
    NoRefreshToken,

    /// Invalid configuration
    ConfigError(String),
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::Rejected(e) => write!(f, "OAuth grant rejected: {e}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthClientError {}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// OAuth 2.0 client for confidential clients
///
/// Sends `client_id`/`client_secret` as an HTTP Basic authorization header
/// and grant parameters as a form body, per RFC 6749 section 2.3.1.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration
    ///
    /// # Arguments
    /// * `config` - OAuth configuration (token_url, client_id, client_secret)
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    /// Refresh the access token using a refresh token
    ///
    /// The provider rotates refresh tokens: each successful grant may carry a
    /// new refresh token that invalidates the one just used. Callers must
    /// persist the rotated token before relying on the new access token.
    ///
    /// # Arguments
    /// * `refresh_token` - Refresh token from the previous grant
    ///
    /// # Returns
    /// New `TokenResponse` with an access token and possibly a rotated
    /// refresh token
    ///
    /// # Errors
    /// Returns error if:
    /// - No refresh token provided
    /// - The grant is rejected
    /// - The response cannot be parsed
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let params = [("grant_type", "refresh_token"), ("refresh_token", refresh_token)];

        self.send_token_request(&params).await
    }

    /// Exchange an authorization code for tokens
    ///
    /// Performed once during setup: the resulting refresh token is persisted
    /// and every later run starts from the refresh token grant.
    ///
    /// # Arguments
    /// * `code` - Authorization code obtained out of band
    ///
    /// # Errors
    /// Returns error if the exchange is rejected or the response cannot be
    /// parsed
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        if code.is_empty() {
            return Err(OAuthClientError::ConfigError(
                "Authorization code must not be empty".to_string(),
            ));
        }

        let params = [("grant_type", "authorization_code"), ("code", code)];

        self.send_token_request(&params).await
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    async fn send_token_request(
        &self,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, OAuthClientError> {
        let response = self
            .client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(params)
            .send()
            .await?;

        // Handle OAuth errors
        if !response.status().is_success() {
            let status = response.status();
            let error: OAuthErrorBody = response.json().await.map_err(|e| {
                OAuthClientError::ParseError(format!("token endpoint returned {status}: {e}"))
            })?;
            return Err(OAuthClientError::Rejected(error));
        }

        // Parse token response
        let token_response: TokenResponse =
            response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;

        Ok(token_response)
    }
}

#[async_trait]
impl TokenEndpoint for OAuthClient {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.refresh_access_token(refresh_token).await
    }

    async fn exchange_authorization_code(
        &self,
        code: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.exchange_authorization_code(code).await
    }
}
