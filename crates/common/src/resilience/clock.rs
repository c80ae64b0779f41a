//! Time abstraction for testability
//!
//! This trait allows time-dependent components to use real system time in
//! production and controlled mock time in tests, enabling deterministic
//! testing of timing behavior without actual delays.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Trait for time operations to enable deterministic testing
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock backed by the tokio runtime's notion of time
///
/// Behaves like [`SystemClock`] in production, but inside a paused tokio
/// runtime (`#[tokio::test(start_paused = true)]`) its `now()` advances with
/// `tokio::time`, so sleeps and elapsed-time checks stay consistent.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Implement Clock for Arc<T> where T: Clock for convenient cloning
impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Mock clock for deterministic testing
///
/// Allows tests to control time progression without actual delays,
/// enabling fast and reliable testing of timing behavior.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock starting at the current instant
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += duration;
        }
    }

    /// Advance the mock clock by milliseconds (convenience method)
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Get the current elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|e| *e).unwrap_or(Duration::ZERO)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        let elapsed = self.elapsed.lock().map(|e| *e).unwrap_or(Duration::ZERO);
        self.start + elapsed
    }

    fn system_time(&self) -> SystemTime {
        let elapsed = self.elapsed.lock().map(|e| *e).unwrap_or(Duration::ZERO);
        SystemTime::UNIX_EPOCH + elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates `SystemClock` behavior for the monotonic now scenario.
    ///
    /// Assertions:
    /// - Ensures consecutive `now()` calls never go backwards.
    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    /// Validates `MockClock::advance` behavior for the controlled time
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `now()` moves forward exactly by the advanced duration.
    /// - Confirms clones share the same underlying elapsed state.
    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new();
        let start = clock.now();

        clock.advance_millis(250);
        assert_eq!(clock.now() - start, Duration::from_millis(250));

        let clone = clock.clone();
        clone.advance(Duration::from_millis(750));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }

    /// Validates `Clock::millis_since_epoch` behavior for the mock wall clock
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms epoch millis track the advanced elapsed time.
    #[test]
    fn test_mock_clock_epoch_millis() {
        let clock = MockClock::new();
        assert_eq!(clock.millis_since_epoch(), 0);

        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.millis_since_epoch(), 2_000);
    }
}
