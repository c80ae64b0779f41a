//! Error types used throughout the extraction engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for decant
///
/// Fatal variants (`Config`, `Auth`, `Discovery`) abort a run; everything
/// else is recorded and handled where it occurs. Per-id fetch failures are
/// never surfaced through this type.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ExtractionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractionError>;
