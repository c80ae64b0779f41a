//! Backoff delay calculation for retry loops

use std::time::Duration;

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Linear backoff: initial_delay + (attempt * increment)
    Linear { initial_delay: Duration, increment: Duration },
    /// Exponential backoff: initial_delay * base^attempt
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Calculate the next delay for the given attempt (0-based)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Linear { initial_delay, increment } => {
                *initial_delay + increment.saturating_mul(attempt)
            }
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let delay = initial_delay.as_millis() as f64 * base.powi(attempt as i32);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Exponential {
            initial_delay: Duration::from_millis(200),
            base: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay() {
        let strategy = BackoffStrategy::Fixed(Duration::from_millis(500));
        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(500));
        assert_eq!(strategy.calculate_delay(5), Duration::from_millis(500));
    }

    #[test]
    fn test_linear_delay() {
        let strategy = BackoffStrategy::Linear {
            initial_delay: Duration::from_millis(100),
            increment: Duration::from_millis(50),
        };
        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(strategy.calculate_delay(2), Duration::from_millis(200));
    }

    #[test]
    fn test_exponential_delay_doubles_and_caps() {
        let strategy = BackoffStrategy::Exponential {
            initial_delay: Duration::from_secs(2),
            base: 2.0,
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(strategy.calculate_delay(0), Duration::from_secs(2));
        assert_eq!(strategy.calculate_delay(1), Duration::from_secs(4));
        assert_eq!(strategy.calculate_delay(2), Duration::from_secs(8));
        assert_eq!(strategy.calculate_delay(10), Duration::from_secs(30));
    }
}
