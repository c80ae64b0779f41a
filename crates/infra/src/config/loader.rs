//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DECANT_API_BASE_URL`: Base URL of the data API
//! - `DECANT_API_TIMEOUT_SECS`: Request timeout in seconds (optional)
//! - `DECANT_API_PAGE_LIMIT`: Listing page size (optional)
//! - `DECANT_API_RATE_LIMIT`: Requests per trailing second (optional)
//! - `DECANT_API_MAX_ATTEMPTS`: Transport attempts per request (optional)
//! - `DECANT_AUTH_TOKEN_URL`: OAuth token endpoint URL
//! - `DECANT_AUTH_CLIENT_ID`: OAuth client id
//! - `DECANT_AUTH_CLIENT_SECRET`: OAuth client secret
//! - `DECANT_AUTH_REFRESH_TOKEN_KEY`: State store key for the refresh token
//! - `DECANT_STATE_BACKEND`: `file` or `vault`
//! - `DECANT_STATE_PATH`: State file path (file backend)
//! - `DECANT_VAULT_ADDR` / `DECANT_VAULT_MOUNT` / `DECANT_VAULT_TOKEN`:
//!   Secret store settings (vault backend)
//! - `DECANT_WORKERS` / `DECANT_BATCH_SIZE` / `DECANT_RETRY_MAX_ATTEMPTS`:
//!   Engine tuning (optional)
//! - `DECANT_OUTPUT_DIR`: Artifact directory
//! - `DECANT_OUTPUT_FORMAT`: `ndjson` or `json` (optional)
//!
//! The resource catalogue cannot be expressed in environment variables;
//! environment-only configurations start with an empty catalogue and rely
//! on a config file to describe resources.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./decant.json` or `./decant.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use decant_domain::config::{
    ApiConfig, AuthConfig, Config, ExtractionConfig, OutputConfig, StateBackendConfig,
};
use decant_domain::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PAGE_LIMIT,
    DEFAULT_RATE_LIMIT_PER_SEC, DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_TRANSPORT_MAX_ATTEMPTS,
    DEFAULT_WORKERS,
};
use decant_domain::{ExtractionError, OutputFormat, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ExtractionError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or fail validation
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `ExtractionError::Config` if required variables are missing,
/// have invalid values, or the resulting configuration fails validation.
pub fn load_from_env() -> Result<Config> {
    let api = ApiConfig {
        base_url: env_var("DECANT_API_BASE_URL")?,
        timeout_secs: env_parse("DECANT_API_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
        page_limit: env_parse("DECANT_API_PAGE_LIMIT", DEFAULT_PAGE_LIMIT)?,
        rate_limit_per_sec: env_parse("DECANT_API_RATE_LIMIT", DEFAULT_RATE_LIMIT_PER_SEC)?,
        max_attempts: env_parse("DECANT_API_MAX_ATTEMPTS", DEFAULT_TRANSPORT_MAX_ATTEMPTS)?,
    };

    let auth = AuthConfig {
        token_url: env_var("DECANT_AUTH_TOKEN_URL")?,
        client_id: env_var("DECANT_AUTH_CLIENT_ID")?,
        client_secret: env_var("DECANT_AUTH_CLIENT_SECRET")?,
        refresh_token_key: env_var("DECANT_AUTH_REFRESH_TOKEN_KEY")?,
        state: state_backend_from_env()?,
    };

    let extraction = ExtractionConfig {
        workers: env_parse("DECANT_WORKERS", DEFAULT_WORKERS)?,
        batch_size: env_parse("DECANT_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
        retry_max_attempts: env_parse("DECANT_RETRY_MAX_ATTEMPTS", DEFAULT_RETRY_MAX_ATTEMPTS)?,
        resources: Vec::new(),
    };

    let output = OutputConfig {
        dir: env_var("DECANT_OUTPUT_DIR")?,
        format: match std::env::var("DECANT_OUTPUT_FORMAT") {
            Ok(raw) => parse_format(&raw)?,
            Err(_) => OutputFormat::Ndjson,
        },
    };

    let config = Config { api, auth, extraction, output };
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `ExtractionError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing or fail validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ExtractionError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ExtractionError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ExtractionError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ExtractionError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ExtractionError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ExtractionError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./decant.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("decant.json"),
            cwd.join("decant.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("decant.json"),
                exe_dir.join("decant.toml"),
            ]);
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.exists())
}

fn state_backend_from_env() -> Result<StateBackendConfig> {
    let backend = env_var("DECANT_STATE_BACKEND")?;
    match backend.to_ascii_lowercase().as_str() {
        "file" => Ok(StateBackendConfig::File { path: env_var("DECANT_STATE_PATH")? }),
        "vault" => Ok(StateBackendConfig::Vault {
            addr: env_var("DECANT_VAULT_ADDR")?,
            mount: env_var("DECANT_VAULT_MOUNT")?,
            token: env_var("DECANT_VAULT_TOKEN")?,
        }),
        other => Err(ExtractionError::Config(format!("Unknown state backend: {other}"))),
    }
}

fn parse_format(raw: &str) -> Result<OutputFormat> {
    match raw.to_ascii_lowercase().as_str() {
        "ndjson" => Ok(OutputFormat::Ndjson),
        "json" => Ok(OutputFormat::Json),
        other => Err(ExtractionError::Config(format!("Unsupported output format: {other}"))),
    }
}

/// Get required environment variable
///
/// # Errors
/// Returns `ExtractionError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ExtractionError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional environment variable, falling back to `default`
///
/// # Errors
/// Returns `ExtractionError::Config` if the variable is set but does not
/// parse.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ExtractionError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use decant_domain::ResourceKind;
    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const REQUIRED_VARS: &[&str] = &[
        "DECANT_API_BASE_URL",
        "DECANT_AUTH_TOKEN_URL",
        "DECANT_AUTH_CLIENT_ID",
        "DECANT_AUTH_CLIENT_SECRET",
        "DECANT_AUTH_REFRESH_TOKEN_KEY",
        "DECANT_STATE_BACKEND",
        "DECANT_STATE_PATH",
        "DECANT_OUTPUT_DIR",
    ];

    fn set_required_vars() {
        std::env::set_var("DECANT_API_BASE_URL", "https://api.example.com/v3");
        std::env::set_var("DECANT_AUTH_TOKEN_URL", "https://auth.example.com/oauth/token");
        std::env::set_var("DECANT_AUTH_CLIENT_ID", "client");
        std::env::set_var("DECANT_AUTH_CLIENT_SECRET", "secret");
        std::env::set_var("DECANT_AUTH_REFRESH_TOKEN_KEY", "refresh_token");
        std::env::set_var("DECANT_STATE_BACKEND", "file");
        std::env::set_var("DECANT_STATE_PATH", "/tmp/state.json");
        std::env::set_var("DECANT_OUTPUT_DIR", "/tmp/out");
    }

    fn clear_all_vars() {
        for key in REQUIRED_VARS {
            std::env::remove_var(key);
        }
        std::env::remove_var("DECANT_API_RATE_LIMIT");
        std::env::remove_var("DECANT_BATCH_SIZE");
        std::env::remove_var("DECANT_OUTPUT_FORMAT");
        std::env::remove_var("DECANT_VAULT_ADDR");
        std::env::remove_var("DECANT_VAULT_MOUNT");
        std::env::remove_var("DECANT_VAULT_TOKEN");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        set_required_vars();
        std::env::set_var("DECANT_API_RATE_LIMIT", "5");
        std::env::set_var("DECANT_BATCH_SIZE", "25");
        std::env::set_var("DECANT_OUTPUT_FORMAT", "json");

        let result = load_from_env();
        assert!(result.is_ok(), "Should load config from env vars, error: {:?}", result.err());

        let config = result.unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com/v3");
        assert_eq!(config.api.rate_limit_per_sec, 5);
        assert_eq!(config.api.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(config.auth.refresh_token_key, "refresh_token");
        assert!(matches!(config.auth.state, StateBackendConfig::File { ref path } if path == "/tmp/state.json"));
        assert_eq!(config.extraction.batch_size, 25);
        assert_eq!(config.extraction.workers, DEFAULT_WORKERS);
        assert!(config.extraction.resources.is_empty());
        assert!(matches!(config.output.format, OutputFormat::Json));

        clear_all_vars();
    }

    #[test]
    fn test_load_from_env_vault_backend() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        set_required_vars();
        std::env::set_var("DECANT_STATE_BACKEND", "vault");
        std::env::set_var("DECANT_VAULT_ADDR", "http://vault:8200");
        std::env::set_var("DECANT_VAULT_MOUNT", "secret");
        std::env::set_var("DECANT_VAULT_TOKEN", "vault-token");

        let config = load_from_env().expect("vault-backed config loads");
        assert!(matches!(
            config.auth.state,
            StateBackendConfig::Vault { ref addr, .. } if addr == "http://vault:8200"
        ));

        clear_all_vars();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_all_vars();

        let result = load_from_env();
        assert!(result.is_err(), "Should fail with missing env var");

        let err = result.unwrap_err();
        assert!(matches!(err, ExtractionError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        set_required_vars();
        std::env::set_var("DECANT_API_RATE_LIMIT", "not-a-number");

        let result = load_from_env();
        assert!(result.is_err(), "Should fail with invalid rate limit");

        let err = result.unwrap_err();
        assert!(matches!(err, ExtractionError::Config(_)), "Should be a Config error");

        clear_all_vars();
    }

    #[test]
    fn test_load_from_env_rejects_invalid_values() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        set_required_vars();
        std::env::set_var("DECANT_API_RATE_LIMIT", "0");

        let result = load_from_env();
        assert!(result.is_err(), "Zero rate limit should fail validation");

        clear_all_vars();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "api": {"base_url": "https://api.example.com/v3"},
            "auth": {
                "token_url": "https://auth.example.com/oauth/token",
                "client_id": "client",
                "client_secret": "secret",
                "refresh_token_key": "refresh_token",
                "state": {"backend": "file", "path": "/tmp/state.json"}
            },
            "extraction": {
                "batch_size": 50,
                "resources": [
                    {"name": "contacts", "path": "contatos", "kind": "paged"},
                    {"name": "orders", "path": "pedidos/vendas", "kind": "windowed"}
                ]
            },
            "output": {"dir": "/tmp/out", "format": "ndjson"}
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_ok(), "Should load config from JSON file, error: {:?}", result.err());

        let config = result.unwrap();
        assert_eq!(config.extraction.batch_size, 50);
        assert_eq!(config.extraction.resources.len(), 2);
        assert_eq!(config.extraction.resources[0].name, "contacts");
        assert_eq!(config.extraction.resources[1].kind, ResourceKind::Windowed);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
[api]
base_url = "https://api.example.com/v3"
rate_limit_per_sec = 3

[auth]
token_url = "https://auth.example.com/oauth/token"
client_id = "client"
client_secret = "secret"
refresh_token_key = "refresh_token"

[auth.state]
backend = "vault"
addr = "http://vault:8200"
mount = "secret"
token = "vault-token"

[extraction]
workers = 2

[[extraction.resources]]
name = "contacts"
path = "contatos"
kind = "paged"

[output]
dir = "/tmp/out"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_ok(), "Should load config from TOML file, error: {:?}", result.err());

        let config = result.unwrap();
        assert_eq!(config.extraction.workers, 2);
        assert!(matches!(config.auth.state, StateBackendConfig::Vault { .. }));
        assert!(matches!(config.output.format, OutputFormat::Ndjson));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(result.is_err(), "Should fail when file not found");

        let err = result.unwrap_err();
        assert!(matches!(err, ExtractionError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let invalid_json = r#"{ "this is": "not valid json" "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_json.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_err(), "Should fail with invalid JSON");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let content = "some content";
        let path = PathBuf::from("test.yaml");
        let result = parse_config(content, &path);
        assert!(result.is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn test_parse_format_values() {
        assert!(matches!(parse_format("ndjson").unwrap(), OutputFormat::Ndjson));
        assert!(matches!(parse_format("JSON").unwrap(), OutputFormat::Json));
        assert!(parse_format("csv").is_err());
    }
}
