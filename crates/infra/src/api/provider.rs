//! Access token supply for outbound API calls

use async_trait::async_trait;
use decant_common::{AccessToken, TokenEndpoint, TokenManager, TokenManagerError};
use decant_domain::{ExtractionError, Result};

/// Provides bearer tokens for the data API and replaces rejected ones.
///
/// The gateway never talks to the token endpoint directly. It asks this
/// trait for the current token and reports 401s back through
/// [`refresh_after_rejection`](Self::refresh_after_rejection), passing the
/// generation of the token the API rejected so concurrent rejections of the
/// same grant collapse into one refresh.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Current access token, establishing a session on first use.
    ///
    /// # Errors
    /// Returns `ExtractionError::Config` when no refresh token has been
    /// seeded, `Auth` when the grant is rejected.
    async fn access_token(&self) -> Result<AccessToken>;

    /// Exchange a rejected token of the given generation for a fresh one.
    ///
    /// # Errors
    /// Returns `ExtractionError::Auth` when the refresh token itself is no
    /// longer accepted, `State` when the rotated token cannot be persisted.
    async fn refresh_after_rejection(&self, observed_generation: u64) -> Result<AccessToken>;
}

#[async_trait]
impl<C: TokenEndpoint + 'static> AccessTokenProvider for TokenManager<C> {
    async fn access_token(&self) -> Result<AccessToken> {
        TokenManager::access_token(self).await.map_err(map_token_error)
    }

    async fn refresh_after_rejection(&self, observed_generation: u64) -> Result<AccessToken> {
        TokenManager::refresh_after_rejection(self, observed_generation)
            .await
            .map_err(map_token_error)
    }
}

/// Translate token manager failures into the domain taxonomy.
///
/// A missing refresh token is a configuration problem the operator fixes by
/// seeding the store; state store failures keep their own variant so a lost
/// rotation is distinguishable from a rejected grant.
fn map_token_error(err: TokenManagerError) -> ExtractionError {
    match err {
        TokenManagerError::MissingRefreshToken { .. } => ExtractionError::Config(err.to_string()),
        TokenManagerError::StateError(_) => ExtractionError::State(err.to_string()),
        TokenManagerError::OAuthError(_) | TokenManagerError::NotAuthenticated => {
            ExtractionError::Auth(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use decant_common::{OAuthClientError, StateError};

    use super::*;

    #[test]
    fn missing_refresh_token_maps_to_config_error() {
        let err = map_token_error(TokenManagerError::MissingRefreshToken {
            key: "refresh_token".to_string(),
        });
        match err {
            ExtractionError::Config(msg) => assert!(msg.contains("refresh_token")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn state_failure_maps_to_state_error() {
        let err = map_token_error(TokenManagerError::StateError(StateError::Io(
            "disk full".to_string(),
        )));
        assert!(matches!(err, ExtractionError::State(_)));
    }

    #[test]
    fn rejected_grant_maps_to_auth_error() {
        let err = map_token_error(TokenManagerError::OAuthError(OAuthClientError::ParseError(
            "bad body".to_string(),
        )));
        assert!(matches!(err, ExtractionError::Auth(_)));
    }

    #[test]
    fn missing_session_maps_to_auth_error() {
        let err = map_token_error(TokenManagerError::NotAuthenticated);
        assert!(matches!(err, ExtractionError::Auth(_)));
    }
}
