//! # Decant Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The authenticated, rate-limited gateway to the data API
//! - Resilient HTTP transport with retry support
//! - State store backends (versioned secret store)
//! - Report rendering and artifact storage
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `decant-core` and `decant-common`
//! - Depends on `decant-domain` for types and errors
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod config;
pub mod http;
pub mod output;
pub mod state;

// Re-export commonly used items
pub use api::{AccessTokenProvider, ApiClient, ApiError, ApiErrorCategory};
pub use http::{HttpClient, HttpClientBuilder};
pub use output::{ArtifactStore, LocalDirStore, ReportWriter};
pub use state::VaultStateStore;
