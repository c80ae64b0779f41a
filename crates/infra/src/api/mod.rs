//! Authenticated gateway to the upstream data API
//!
//! `ApiClient` implements the extraction gateway port: bearer-authenticated
//! JSON requests, a global sliding-window rate limit acquired before every
//! call, and a single re-authentication when the API rejects a token.

pub mod client;
pub mod errors;
pub mod provider;

pub use client::ApiClient;
pub use errors::{ApiError, ApiErrorCategory};
pub use provider::AccessTokenProvider;
