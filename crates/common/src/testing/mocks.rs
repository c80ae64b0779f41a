//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{OAuthClientError, OAuthErrorBody, TokenEndpoint, TokenResponse};

type ScriptedGrant = Result<(String, Option<String>), String>;

/// Mock token endpoint for testing
///
/// Scripts grant outcomes in order and records every refresh token it is
/// handed, so tests can assert both how many grants happened and which
/// rotation generation each one used.
///
/// # Examples
///
/// ```
/// use decant_common::testing::MockTokenEndpoint;
///
/// let endpoint = MockTokenEndpoint::new();
/// endpoint.push_success("A1", Some("R2"));
/// endpoint.push_failure("invalid_grant");
/// ```
#[derive(Debug, Clone)]
pub struct MockTokenEndpoint {
    responses: Arc<Mutex<VecDeque<ScriptedGrant>>>,
    calls: Arc<AtomicU32>,
    refresh_tokens_seen: Arc<Mutex<Vec<String>>>,
    codes_seen: Arc<Mutex<Vec<String>>>,
}

impl MockTokenEndpoint {
    /// Create a new mock endpoint with no scripted responses
    ///
    /// An unscripted call fails with a configuration error rather than
    /// panicking, so exhausting the script surfaces as a test failure with
    /// the manager's own error path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicU32::new(0)),
            refresh_tokens_seen: Arc::new(Mutex::new(Vec::new())),
            codes_seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script a successful grant
    ///
    /// # Arguments
    /// * `access_token` - Access token the grant returns
    /// * `refresh_token` - Rotated refresh token, or `None` to skip rotation
    pub fn push_success(&self, access_token: &str, refresh_token: Option<&str>) {
        self.responses
            .lock()
            .push_back(Ok((access_token.to_string(), refresh_token.map(String::from))));
    }

    /// Script a rejected grant with the given OAuth error code
    pub fn push_failure(&self, error_code: &str) {
        self.responses.lock().push_back(Err(error_code.to_string()));
    }

    /// Get a handle to the grant call counter
    ///
    /// Clone this before handing the endpoint to a manager; the counter
    /// keeps counting after the move.
    #[must_use]
    pub fn call_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }

    /// Get a handle to the refresh tokens the endpoint has seen, in order
    #[must_use]
    pub fn refresh_tokens_seen(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.refresh_tokens_seen)
    }

    /// Get a handle to the authorization codes the endpoint has seen
    #[must_use]
    pub fn codes_seen(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.codes_seen)
    }

    /// Get the number of grant calls made so far
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> Result<TokenResponse, OAuthClientError> {
        match self.responses.lock().pop_front() {
            Some(Ok((access_token, refresh_token))) => Ok(TokenResponse {
                access_token,
                refresh_token,
                token_type: Some("Bearer".to_string()),
                expires_in: Some(21600),
                scope: None,
            }),
            Some(Err(code)) => Err(OAuthClientError::Rejected(OAuthErrorBody {
                error: code,
                error_description: None,
            })),
            None => Err(OAuthClientError::ConfigError(
                "no scripted token response left".to_string(),
            )),
        }
    }
}

impl Default for MockTokenEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenEndpoint for MockTokenEndpoint {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens_seen.lock().push(refresh_token.to_string());
        self.next_response()
    }

    async fn exchange_authorization_code(
        &self,
        code: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.codes_seen.lock().push(code.to_string());
        self.next_response()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::mocks.
    use super::*;

    /// Validates `MockTokenEndpoint` behavior for the scripted sequence
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms responses come back in push order.
    /// - Confirms refresh tokens are recorded in call order.
    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let endpoint = MockTokenEndpoint::new();
        endpoint.push_success("A1", Some("R2"));
        endpoint.push_failure("invalid_grant");

        let first = endpoint.refresh_access_token("R1").await.unwrap();
        assert_eq!(first.access_token, "A1");
        assert_eq!(first.refresh_token, Some("R2".to_string()));

        let second = endpoint.refresh_access_token("R2").await;
        assert!(matches!(second, Err(OAuthClientError::Rejected(_))));

        assert_eq!(endpoint.calls(), 2);
        assert_eq!(*endpoint.refresh_tokens_seen().lock(), vec!["R1", "R2"]);
    }

    /// Validates `MockTokenEndpoint` behavior for the exhausted script
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures an unscripted call fails with `ConfigError` instead of
    ///   panicking.
    #[tokio::test]
    async fn test_exhausted_script_fails_cleanly() {
        let endpoint = MockTokenEndpoint::new();

        let result = endpoint.refresh_access_token("R1").await;

        assert!(matches!(result, Err(OAuthClientError::ConfigError(_))));
    }
}
