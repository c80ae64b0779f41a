//! OAuth 2.0 refresh token grant infrastructure
//!
//! This module provides the token lifecycle for a headless extraction client
//! authenticating against a rate-limited provider API. There is no browser
//! flow at runtime: an authorization code is exchanged once during setup, and
//! every run after that lives off the persisted refresh token.
//!
//! # Features
//!
//! - **Refresh Token Grant**: RFC 6749 confidential client flow with HTTP
//!   Basic client authentication
//! - **Token Rotation**: Rotated refresh tokens persisted through the state
//!   store before the new access token is used
//! - **Rejection-Driven Refresh**: Access tokens are refreshed when the API
//!   rejects them, not on a timer
//! - **Single-Flight**: Concurrent 401s collapse into one grant
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   TokenManager  │  Session lifecycle + rotation persistence
//! └────────┬────────┘
//!          │
//!          ├──► TokenEndpoint  (OAuthClient over reqwest)
//!          └──► StateStore     (file or secret backend)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: Core OAuth types (`TokenResponse`, `OAuthConfig`,
//!   `OAuthErrorBody`)
//! - **[`client`]**: Token endpoint HTTP client
//! - **[`token_manager`]**: Session lifecycle and rotation handling
//! - **[`traits`]**: `TokenEndpoint` abstraction for testing

pub mod client;
pub mod token_manager;
pub mod traits;
pub mod types;

// Re-export commonly used types and functions
pub use client::{OAuthClient, OAuthClientError};
pub use token_manager::{AccessToken, TokenManager, TokenManagerError};
pub use traits::TokenEndpoint;
pub use types::{OAuthConfig, OAuthErrorBody, TokenResponse};
