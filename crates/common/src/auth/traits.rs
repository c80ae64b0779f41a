//! Traits for token endpoint operations
//!
//! These traits enable dependency injection and testing by abstracting the
//! external authorization server.

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::types::TokenResponse;

/// Trait for token endpoint operations
///
/// This trait abstracts the OAuth token endpoint to enable testing with mock
/// implementations and to support different providers or configurations.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Refresh the access token using a refresh token
    ///
    /// # Arguments
    /// * `refresh_token` - Refresh token from the previous grant
    ///
    /// # Returns
    /// New `TokenResponse` with an access token and possibly a rotated
    /// refresh token
    ///
    /// # Errors
    /// Returns error if the grant is rejected or the response cannot be
    /// parsed
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError>;

    /// Exchange an authorization code for tokens
    ///
    /// Used once during initial setup to obtain the first refresh token.
    ///
    /// # Arguments
    /// * `code` - Authorization code obtained out of band
    ///
    /// # Errors
    /// Returns error if the exchange fails or the response cannot be parsed
    async fn exchange_authorization_code(
        &self,
        code: &str,
    ) -> Result<TokenResponse, OAuthClientError>;
}
