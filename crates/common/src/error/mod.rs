//! Common error types and utilities shared across the extraction crates
//!
//! This module provides standardized error handling infrastructure that can be
//! used across all modules in the application. It includes common error
//! variants, conversion patterns, and utility functions for error handling.
//!
//! # Error Handling Architecture
//!
//! The error handling system is built on three key components:
//!
//! 1. **`CommonError`**: An enum of common error patterns that appear across
//!    multiple modules (timeouts, rate limiting, serialization, etc.)
//!
//! 2. **`ErrorClassification` trait**: A standard interface for classifying
//!    errors by their characteristics (retryability, severity, criticality)
//!
//! 3. **`ErrorSeverity` enum**: A unified severity level system for monitoring
//!    and alerting across all error types
//!
//! Module-specific errors should **compose** with `CommonError` rather than
//! duplicating common patterns:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum MyModuleError {
//!     #[error("Invalid cursor: {0}")]
//!     InvalidCursor(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Common error variants that appear across multiple modules
///
/// This enum provides standardized error types that can be embedded in
/// module-specific error enums to ensure consistency across the application.
#[derive(Debug, Clone)]
pub enum CommonError {
    /// Configuration-related errors
    Config { message: String, field: Option<String> },

    /// Serialization or deserialization errors
    Serialization { message: String, format: Option<String> },

    /// Data persistence errors (file I/O, secret store, etc.)
    Persistence { message: String, operation: Option<String> },

    /// Rate limiting errors
    RateLimitExceeded {
        limit: Option<u32>,
        window: Option<Duration>,
        retry_after: Option<Duration>,
    },

    /// Timeout errors
    Timeout { operation: String, duration: Duration },

    /// Internal errors that shouldn't normally occur
    Internal { message: String, context: Option<String> },

    /// Task cancellation (async)
    TaskCancelled { task_id: String, reason: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field } => {
                if let Some(field) = field {
                    write!(f, "Configuration error in field '{}': {}", field, message)
                } else {
                    write!(f, "Configuration error: {}", message)
                }
            }
            Self::Serialization { message, format } => {
                if let Some(format) = format {
                    write!(f, "Serialization error ({}): {}", format, message)
                } else {
                    write!(f, "Serialization error: {}", message)
                }
            }
            Self::Persistence { message, operation } => {
                if let Some(op) = operation {
                    write!(f, "Persistence error during '{}': {}", op, message)
                } else {
                    write!(f, "Persistence error: {}", message)
                }
            }
            Self::RateLimitExceeded { limit, window, retry_after } => {
                let mut msg = "Rate limit exceeded".to_string();
                if let (Some(limit), Some(window)) = (limit, window) {
                    msg.push_str(&format!(": {} requests per {:?}", limit, window));
                }
                if let Some(retry) = retry_after {
                    msg.push_str(&format!(" (retry in {:?})", retry));
                }
                write!(f, "{}", msg)
            }
            Self::Timeout { operation, duration } => {
                write!(f, "Operation '{}' timed out after {:?}", operation, duration)
            }
            Self::Internal { message, context } => {
                if let Some(ctx) = context {
                    write!(f, "Internal error in '{}': {}", ctx, message)
                } else {
                    write!(f, "Internal error: {}", message)
                }
            }
            Self::TaskCancelled { task_id, reason } => {
                if let Some(reason) = reason {
                    write!(f, "Task '{}' cancelled: {}", task_id, reason)
                } else {
                    write!(f, "Task '{}' cancelled", task_id)
                }
            }
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. } | Self::Timeout { .. })
    }

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } => ErrorSeverity::Error,
            Self::Serialization { .. } => ErrorSeverity::Error,
            Self::Persistence { .. } => ErrorSeverity::Error,
            Self::RateLimitExceeded { .. } => ErrorSeverity::Warning,
            Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::Internal { .. } => ErrorSeverity::Critical,
            Self::TaskCancelled { .. } => ErrorSeverity::Info,
        }
    }

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl CommonError {
    /// Create a simple configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error for a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a simple serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization { message: message.into(), format: None }
    }

    /// Create a serialization error with format information
    pub fn serialization_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }

    /// Create a simple persistence error
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence { message: message.into(), operation: None }
    }

    /// Create a persistence error for a specific operation
    pub fn persistence_op<S: Into<String>, O: Into<String>>(operation: O, message: S) -> Self {
        Self::Persistence { message: message.into(), operation: Some(operation.into()) }
    }

    /// Create a rate limit error with details
    pub fn rate_limit_detailed(
        limit: u32,
        window: Duration,
        retry_after: Option<Duration>,
    ) -> Self {
        Self::RateLimitExceeded { limit: Some(limit), window: Some(window), retry_after }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration: Duration) -> Self {
        Self::Timeout { operation: operation.into(), duration }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), context: None }
    }

    /// Create an internal error with context
    pub fn internal_with_context<S: Into<String>, C: Into<String>>(message: S, context: C) -> Self {
        Self::Internal { message: message.into(), context: Some(context.into()) }
    }

    /// Create a task cancellation error
    pub fn task_cancelled<S: Into<String>>(task_id: S) -> Self {
        Self::TaskCancelled { task_id: task_id.into(), reason: None }
    }

    /// Get the error type name for logging and metrics
    pub fn error_type_name(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Serialization { .. } => "serialization",
            Self::Persistence { .. } => "persistence",
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::Timeout { .. } => "timeout",
            Self::Internal { .. } => "internal",
            Self::TaskCancelled { .. } => "task_cancelled",
        }
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

/// Standard interface for classifying errors by their characteristics
///
/// All error types in the system should implement this trait to enable
/// consistent retry logic and unified monitoring across modules.
pub trait ErrorClassification {
    /// Can this operation be retried?
    fn is_retryable(&self) -> bool;

    /// How serious is this error?
    fn severity(&self) -> ErrorSeverity;

    /// Does this require immediate attention?
    fn is_critical(&self) -> bool;

    /// Suggested retry delay, if applicable
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Unified severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, expected conditions
    Info,
    /// Degraded but operational
    Warning,
    /// Failure requiring attention
    Error,
    /// System integrity at risk
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the error module.
    use super::*;

    /// Validates `CommonError::config` behavior for the display formatting
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures the message contains the field name when present.
    /// - Ensures the plain form omits the field clause.
    #[test]
    fn test_config_error_display() {
        let plain = CommonError::config("missing base URL");
        assert_eq!(plain.to_string(), "Configuration error: missing base URL");

        let with_field = CommonError::config_field("api.base_url", "must not be empty");
        assert!(with_field.to_string().contains("api.base_url"));
    }

    /// Validates `ErrorClassification` behavior for the retryability scenario.
    ///
    /// Assertions:
    /// - Ensures rate limit and timeout errors are retryable.
    /// - Ensures config, persistence, and cancellation errors are not.
    #[test]
    fn test_retryability_classification() {
        let rate = CommonError::rate_limit_detailed(3, Duration::from_secs(1), None);
        assert!(rate.is_retryable());

        let timeout = CommonError::timeout("fetch_page", Duration::from_secs(30));
        assert!(timeout.is_retryable());

        assert!(!CommonError::config("bad").is_retryable());
        assert!(!CommonError::persistence("disk full").is_retryable());
        assert!(!CommonError::task_cancelled("worker_pool").is_retryable());
    }

    /// Validates `ErrorClassification::severity` behavior for the severity
    /// mapping scenario.
    ///
    /// Assertions:
    /// - Confirms `Internal` maps to `Critical` and is flagged critical.
    /// - Confirms `TaskCancelled` maps to `Info`.
    /// - Confirms severity ordering is monotonic.
    #[test]
    fn test_severity_mapping() {
        let internal = CommonError::internal("invariant violated");
        assert_eq!(internal.severity(), ErrorSeverity::Critical);
        assert!(internal.is_critical());

        let cancelled = CommonError::task_cancelled("worker_pool");
        assert_eq!(cancelled.severity(), ErrorSeverity::Info);
        assert!(!cancelled.is_critical());

        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }

    /// Validates `ErrorClassification::retry_after` behavior for the retry
    /// delay hint scenario.
    ///
    /// Assertions:
    /// - Confirms the configured retry hint is surfaced.
    /// - Ensures errors without a hint return `None`.
    #[test]
    fn test_retry_after_hint() {
        let hint = Duration::from_millis(350);
        let rate = CommonError::rate_limit_detailed(3, Duration::from_secs(1), Some(hint));
        assert_eq!(rate.retry_after(), Some(hint));

        assert_eq!(CommonError::config("x").retry_after(), None);
    }

    /// Validates `From<std::io::Error>` behavior for the io conversion
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures io errors convert into the persistence variant.
    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: CommonError = io.into();
        assert!(matches!(err, CommonError::Persistence { .. }));
        assert_eq!(err.error_type_name(), "persistence");
    }
}
