//! OAuth 2.0 types and structures
//!
//! Defines the data structures exchanged with the provider's token endpoint.
//! Access tokens are held in memory only; refresh tokens rotate on every
//! grant and are persisted through the state store.

use std::fmt;

use serde::Deserialize;

/// OAuth token response from the authorization server
///
/// Standard OAuth 2.0 token response format (RFC 6749).
/// Deserializes responses from `/oauth/token` endpoints.
///
/// Only `access_token` is required: some providers omit `expires_in` or the
/// rotated `refresh_token`, and the manager treats both as optional.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer access token for API authentication
    pub access_token: String,

    /// Rotated refresh token for the next grant
    /// Optional because some providers reuse the previous refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Token type (always "Bearer" for OAuth 2.0)
    #[serde(default)]
    pub token_type: Option<String>,

    /// Access token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,

    /// Granted scopes (space-separated)
    #[serde(default)]
    pub scope: Option<String>,
}

/// OAuth configuration for the token endpoint
///
/// Credentials are sent as an HTTP Basic authorization header, the scheme
/// confidential clients use for the refresh token grant.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Full token endpoint URL (e.g., "https://api.example.com/v3/oauth/token")
    pub token_url: String,

    /// OAuth client ID
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,
}

impl OAuthConfig {
    /// Create a new OAuth configuration
    #[must_use]
    pub fn new(token_url: String, client_id: String, client_secret: String) -> Self {
        Self { token_url, client_id, client_secret }
    }
}

/// OAuth error response from authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 section 5.2).
#[derive(Debug, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthErrorBody {}
