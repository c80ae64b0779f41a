//! Shared utilities for the Decant extraction crates.
//!
//! # Safety and Quality
//!
//! This crate enforces strict safety and quality standards to ensure
//! reliability across all Decant components.
//!
//! # Modules
//!
//! - `error`: shared error type with classification helpers
//! - `resilience`: request pacing, backoff, and worker pooling
//! - `state`: durable key-value persistence for credentials and cursors
//! - `auth`: OAuth 2.0 token lifecycle management
//! - `testing`: mocks and fixtures shared by unit and integration tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod error;
pub mod resilience;
pub mod state;

// Testing utilities
// ---------------------------------------------------------------
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{
    AccessToken, OAuthClient, OAuthClientError, OAuthConfig, TokenEndpoint, TokenManager,
    TokenManagerError, TokenResponse,
};
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
pub use resilience::{
    Clock, MockClock, SlidingWindowLimiter, SystemClock, TokioClock, WorkerPool, WorkerPoolConfig,
};
pub use state::{MemoryStateStore, StateError, StateStore};
