//! Configuration structures
//!
//! The full configuration tree consumed by the binary. Loading (environment
//! variables, file probing) lives in the infra crate; these are the pure
//! data shapes with their defaults and validation rules.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PAGE_LIMIT, DEFAULT_RATE_LIMIT_PER_SEC,
    DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_TRANSPORT_MAX_ATTEMPTS, DEFAULT_WORKERS,
};
use crate::errors::{ExtractionError, Result};
use crate::types::{OutputFormat, ResourceSpec};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
}

/// Upstream data API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the data API, without trailing slash
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Global ceiling on requests per trailing one-second window
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_sec: u32,
    /// Transport-level attempts per request (transient failures only)
    #[serde(default = "default_transport_attempts")]
    pub max_attempts: u32,
}

/// OAuth2 client settings and refresh-token persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Key the refresh token is stored under in the state backend
    pub refresh_token_key: String,
    pub state: StateBackendConfig,
}

/// Which state backend persists credentials between runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StateBackendConfig {
    /// Durable JSON file on the local filesystem
    File { path: String },
    /// Versioned secret store reachable over HTTP
    Vault { addr: String, mount: String, token: String },
}

/// Engine tuning knobs and the resource catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Requested worker count; the engine clamps this to its hard cap
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_retry_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            resources: Vec::new(),
        }
    }
}

/// Where and how reports are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: String,
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

impl Config {
    /// Reject configurations the engine cannot run with.
    ///
    /// # Errors
    /// Returns `ExtractionError::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ExtractionError::Config("api.base_url must not be empty".to_string()));
        }
        if self.api.page_limit == 0 {
            return Err(ExtractionError::Config("api.page_limit must be at least 1".to_string()));
        }
        if self.api.rate_limit_per_sec == 0 {
            return Err(ExtractionError::Config(
                "api.rate_limit_per_sec must be at least 1".to_string(),
            ));
        }
        if self.auth.token_url.trim().is_empty() {
            return Err(ExtractionError::Config("auth.token_url must not be empty".to_string()));
        }
        if self.auth.client_id.trim().is_empty() {
            return Err(ExtractionError::Config("auth.client_id must not be empty".to_string()));
        }
        if self.auth.refresh_token_key.trim().is_empty() {
            return Err(ExtractionError::Config(
                "auth.refresh_token_key must not be empty".to_string(),
            ));
        }
        if self.extraction.workers == 0 {
            return Err(ExtractionError::Config(
                "extraction.workers must be at least 1".to_string(),
            ));
        }
        if self.extraction.batch_size == 0 {
            return Err(ExtractionError::Config(
                "extraction.batch_size must be at least 1".to_string(),
            ));
        }
        if self.output.dir.trim().is_empty() {
            return Err(ExtractionError::Config("output.dir must not be empty".to_string()));
        }
        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_rate_limit() -> u32 {
    DEFAULT_RATE_LIMIT_PER_SEC
}

fn default_transport_attempts() -> u32 {
    DEFAULT_TRANSPORT_MAX_ATTEMPTS
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_MAX_ATTEMPTS
}

fn default_format() -> OutputFormat {
    OutputFormat::Ndjson
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            api: ApiConfig {
                base_url: "https://api.example.com/v3".to_string(),
                timeout_secs: 30,
                page_limit: 100,
                rate_limit_per_sec: 3,
                max_attempts: 3,
            },
            auth: AuthConfig {
                token_url: "https://auth.example.com/oauth/token".to_string(),
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                refresh_token_key: "REFRESH_TOKEN".to_string(),
                state: StateBackendConfig::File { path: "/tmp/state.json".to_string() },
            },
            extraction: ExtractionConfig::default(),
            output: OutputConfig { dir: "/tmp/out".to_string(), format: OutputFormat::Ndjson },
        }
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_base_url() {
        let mut config = valid_config();
        config.api.base_url = "  ".to_string();
        assert!(matches!(config.validate(), Err(ExtractionError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_rate_limit() {
        let mut config = valid_config();
        config.api.rate_limit_per_sec = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = valid_config();
        config.extraction.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn state_backend_deserializes_from_tagged_form() {
        let file: StateBackendConfig =
            serde_json::from_str(r#"{"backend":"file","path":"/var/state.json"}"#)
                .expect("file backend parses");
        assert!(matches!(file, StateBackendConfig::File { .. }));

        let vault: StateBackendConfig = serde_json::from_str(
            r#"{"backend":"vault","addr":"http://vault:8200","mount":"secret","token":"t"}"#,
        )
        .expect("vault backend parses");
        assert!(matches!(vault, StateBackendConfig::Vault { .. }));
    }

    #[test]
    fn extraction_defaults_apply_when_section_missing() {
        let json = r#"{
            "api": {"base_url": "https://api.example.com"},
            "auth": {
                "token_url": "https://auth.example.com/token",
                "client_id": "c",
                "client_secret": "s",
                "refresh_token_key": "K",
                "state": {"backend": "file", "path": "/tmp/s.json"}
            },
            "output": {"dir": "/tmp/out"}
        }"#;
        let config: Config = serde_json::from_str(json).expect("config parses");
        assert_eq!(config.extraction.workers, DEFAULT_WORKERS);
        assert_eq!(config.extraction.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.api.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(config.api.rate_limit_per_sec, DEFAULT_RATE_LIMIT_PER_SEC);
        assert!(matches!(config.output.format, OutputFormat::Ndjson));
    }
}
