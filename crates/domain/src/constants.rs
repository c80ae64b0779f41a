//! Application constants
//!
//! Centralized location for all domain-level defaults used throughout the
//! extraction engine.

// Upstream API pacing
pub const DEFAULT_RATE_LIMIT_PER_SEC: u32 = 3;
pub const RATE_WINDOW_MS: u64 = 1_000;
pub const RATE_SAFETY_MARGIN_MS: u64 = 10;

// Concurrency and batching
pub const DEFAULT_WORKERS: usize = 3;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const BATCH_NAME_PREFIX: &str = "batch_";

// Recovery
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BACKOFF_BASE_SECS: u64 = 2;

// Transport
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TRANSPORT_MAX_ATTEMPTS: u32 = 3;

// Pipelines
pub const DEFAULT_WINDOW_DAYS: i64 = 7;
