//! Resilience patterns for fault tolerance and request pacing
//!
//! This module provides **generic, reusable** resilience patterns including:
//! - **Sliding Window Rate Limiting**: Caps requests inside a trailing time
//!   window to honor upstream API quotas
//! - **Backoff Strategies**: Configurable delay calculation for retry loops
//! - **Worker Pool**: Bounded concurrent task execution with a hard cap
//!
//! These patterns help build robust extraction pipelines that can handle
//! strict upstream quotas and transient failures gracefully.
//!
//! All time-dependent components are generic over the [`Clock`] trait so that
//! tests can drive them deterministically with [`MockClock`] or tokio's paused
//! runtime via [`TokioClock`].

pub mod backoff;
pub mod clock;
pub mod pool;
pub mod rate_limiter;

// Re-export clock abstraction
pub use clock::{Clock, MockClock, SystemClock, TokioClock};
// Re-export backoff types
pub use backoff::BackoffStrategy;
// Re-export worker pool types
pub use pool::{WorkerPool, WorkerPoolConfig, WorkerPoolMetrics, MAX_WORKERS};
// Re-export rate limiter types
pub use rate_limiter::{SlidingWindowConfig, SlidingWindowConfigBuilder, SlidingWindowLimiter};
