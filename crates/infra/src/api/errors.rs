//! API error types and classification
//!
//! Classifies HTTP responses from the data API by category so callers can
//! tell fatal failures from retryable ones, with conversion to the domain
//! error taxonomy.

use std::fmt;

use decant_common::{ErrorClassification, ErrorSeverity};
use decant_domain::ExtractionError;
use reqwest::StatusCode;

/// API error category
///
/// Network-level failures (timeouts, refused connections) never reach this
/// classification; the transport maps those to `ExtractionError::Transport`
/// after its own retry policy. These categories cover responses the API
/// actually produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication failed (401, 403)
    Authentication,

    /// Rate limit exceeded (429)
    RateLimited,

    /// Invalid request or data (4xx except 401, 403, 429)
    Validation,

    /// Server is unavailable (5xx errors)
    ServerUnavailable,

    /// Unknown or unclassified error
    Unknown,
}

impl ApiErrorCategory {
    /// Returns true if a request failing this way is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerUnavailable | Self::RateLimited)
    }
}

impl fmt::Display for ApiErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "Authentication Failed"),
            Self::RateLimited => write!(f, "Rate Limited"),
            Self::Validation => write!(f, "Validation Error"),
            Self::ServerUnavailable => write!(f, "Server Unavailable"),
            Self::Unknown => write!(f, "Unknown Error"),
        }
    }
}

/// API error with category metadata
///
/// Used within the gateway for detailed handling. External callers receive
/// `ExtractionError` via conversion.
#[derive(Debug, Clone)]
pub struct ApiError {
    category: ApiErrorCategory,
    message: String,
    context: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(category: ApiErrorCategory, message: impl Into<String>) -> Self {
        Self { category, message: message.into(), context: None }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Get the error category
    pub fn category(&self) -> ApiErrorCategory {
        self.category
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error context
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Classify an HTTP status code into an error category
    pub fn from_status(status: StatusCode) -> Self {
        let category = match status.as_u16() {
            401 | 403 => ApiErrorCategory::Authentication,
            429 => ApiErrorCategory::RateLimited,
            400 | 404 | 422 => ApiErrorCategory::Validation,
            500..=599 => ApiErrorCategory::ServerUnavailable,
            _ => ApiErrorCategory::Unknown,
        };

        Self::new(
            category,
            format!("HTTP {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("Unknown")),
        )
    }

    /// Convert to the domain error taxonomy
    pub fn into_domain_error(self) -> ExtractionError {
        let detail = self.detail();
        match self.category {
            ApiErrorCategory::Authentication => ExtractionError::Auth(detail),
            ApiErrorCategory::Validation => ExtractionError::InvalidInput(detail),
            ApiErrorCategory::RateLimited | ApiErrorCategory::ServerUnavailable => {
                ExtractionError::Transport(detail)
            }
            ApiErrorCategory::Unknown => ExtractionError::Internal(detail),
        }
    }

    fn detail(&self) -> String {
        match &self.context {
            Some(ctx) => format!("{} ({ctx})", self.message),
            None => self.message.clone(),
        }
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }

    fn severity(&self) -> ErrorSeverity {
        match self.category {
            // Rejected credentials break every scheduled run until an
            // operator re-authorizes.
            ApiErrorCategory::Authentication => ErrorSeverity::Critical,
            ApiErrorCategory::RateLimited | ApiErrorCategory::ServerUnavailable => {
                ErrorSeverity::Warning
            }
            ApiErrorCategory::Validation | ApiErrorCategory::Unknown => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self.category, ApiErrorCategory::Authentication)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl From<ApiError> for ExtractionError {
    fn from(err: ApiError) -> Self {
        err.into_domain_error()
    }
}
