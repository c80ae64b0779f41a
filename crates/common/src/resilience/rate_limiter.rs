//! Sliding window rate limiting for upstream API quotas
//!
//! Enforces a hard cap on the number of acquisitions inside a trailing time
//! window. Unlike a token bucket there is no burst allowance: if the upstream
//! quota is "3 requests per second", at no point may more than 3 acquisitions
//! fall inside any trailing one-second window.
//!
//! The limiter is shared across workers by cloning; all clones observe the
//! same window.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::clock::{Clock, SystemClock};

/// Configuration for the sliding window rate limiter
#[derive(Debug, Clone)]
pub struct SlidingWindowConfig {
    /// Maximum number of acquisitions inside a trailing window
    pub max_requests: u32,
    /// Length of the trailing window
    pub window: Duration,
    /// Extra delay added after the oldest admission ages out, absorbing
    /// clock skew between this process and the upstream quota accounting
    pub safety_margin: Duration,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window: Duration::from_secs(1),
            safety_margin: Duration::from_millis(10),
        }
    }
}

impl SlidingWindowConfig {
    /// Create a new configuration builder
    pub fn builder() -> SlidingWindowConfigBuilder {
        SlidingWindowConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_requests == 0 {
            return Err("max_requests must be greater than 0".to_string());
        }
        if self.window.is_zero() {
            return Err("window must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Builder for SlidingWindowConfig
#[derive(Debug)]
pub struct SlidingWindowConfigBuilder {
    config: SlidingWindowConfig,
}

impl Default for SlidingWindowConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SlidingWindowConfigBuilder {
    pub fn new() -> Self {
        Self { config: SlidingWindowConfig::default() }
    }

    pub fn max_requests(mut self, max_requests: u32) -> Self {
        self.config.max_requests = max_requests;
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    pub fn safety_margin(mut self, margin: Duration) -> Self {
        self.config.safety_margin = margin;
        self
    }

    pub fn build(self) -> Result<SlidingWindowConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A slot was free and has been claimed
    Granted,
    /// The window is full; the earliest instant a slot can open up
    RetryAt(Instant),
}

/// Time-ordered record of admissions inside the current window
#[derive(Debug, Default)]
struct WindowState {
    admissions: VecDeque<Instant>,
}

impl WindowState {
    /// Drop admissions that have aged out of the trailing window, then either
    /// claim a slot or report when the oldest remaining admission expires.
    fn admit(&mut self, now: Instant, config: &SlidingWindowConfig) -> Admission {
        while let Some(front) = self.admissions.front() {
            if now.duration_since(*front) >= config.window {
                self.admissions.pop_front();
            } else {
                break;
            }
        }

        if (self.admissions.len() as u32) < config.max_requests {
            self.admissions.push_back(now);
            Admission::Granted
        } else {
            // front() is Some here: the window holds max_requests >= 1 entries
            let oldest = self.admissions.front().copied().unwrap_or(now);
            Admission::RetryAt(oldest + config.window + config.safety_margin)
        }
    }

    fn in_window(&mut self, now: Instant, window: Duration) -> usize {
        while let Some(front) = self.admissions.front() {
            if now.duration_since(*front) >= window {
                self.admissions.pop_front();
            } else {
                break;
            }
        }
        self.admissions.len()
    }
}

/// Sliding window rate limiter
///
/// Every call to [`acquire`](Self::acquire) claims one slot in the trailing
/// window, sleeping until one opens up when the window is full. After each
/// sleep the window is re-checked rather than assuming the slot is still
/// free, so concurrent acquirers cannot oversubscribe the quota.
///
/// # Examples
///
/// ```rust
/// use decant_common::resilience::{SlidingWindowConfig, SlidingWindowLimiter};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = SlidingWindowLimiter::new(SlidingWindowConfig::default())?;
///
/// limiter.acquire().await;
/// // at most 3 acquisitions complete per trailing second
/// # Ok(())
/// # }
/// ```
pub struct SlidingWindowLimiter<C: Clock = SystemClock> {
    config: SlidingWindowConfig,
    state: Arc<Mutex<WindowState>>,
    clock: Arc<C>,
}

impl<C: Clock> SlidingWindowLimiter<C> {
    /// Create a new limiter with a custom clock
    pub fn with_clock(config: SlidingWindowConfig, clock: C) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            config,
            state: Arc::new(Mutex::new(WindowState::default())),
            clock: Arc::new(clock),
        })
    }

    /// Try to claim a slot without waiting
    ///
    /// Returns `true` if a slot was claimed, `false` if the window is full.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        match self.state.lock().admit(now, &self.config) {
            Admission::Granted => true,
            Admission::RetryAt(_) => {
                debug!(
                    "Rate limit: window full ({}/{})",
                    self.config.max_requests, self.config.max_requests
                );
                false
            }
        }
    }

    /// Claim a slot, sleeping until one opens up
    ///
    /// Sleeps until the oldest admission ages out of the window plus the
    /// safety margin, then re-checks. Under contention a waiter may lose the
    /// freed slot to another and sleep again.
    pub async fn acquire(&self) {
        loop {
            let admission = {
                let now = self.clock.now();
                self.state.lock().admit(now, &self.config)
            };

            match admission {
                Admission::Granted => return,
                Admission::RetryAt(at) => {
                    let wait = at.saturating_duration_since(self.clock.now());
                    debug!("Rate limit: window full, waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Number of admissions currently inside the trailing window
    pub fn in_flight(&self) -> usize {
        let now = self.clock.now();
        self.state.lock().in_window(now, self.config.window)
    }

    /// Number of slots currently free
    pub fn available(&self) -> u32 {
        self.config.max_requests.saturating_sub(self.in_flight() as u32)
    }

    /// The limiter's configuration
    pub fn config(&self) -> &SlidingWindowConfig {
        &self.config
    }
}

impl SlidingWindowLimiter<SystemClock> {
    /// Create a new limiter with the system clock
    pub fn new(config: SlidingWindowConfig) -> Result<Self, String> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Clone for SlidingWindowLimiter<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}
