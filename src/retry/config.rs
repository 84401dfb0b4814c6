use std::time::Duration;

/// Configuration for the Retry-After driven retry policy.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts including the first one
    pub max_attempts: usize,
    /// Factor applied to server supplied delays so the next attempt lands after expiry
    pub margin_factor: f64,
    /// Wait used when an attempt is retryable but carries no delay hint
    pub fallback_delay: Duration,
}

const DEFAULT_MAX_ATTEMPTS: usize = 10;
const DEFAULT_MARGIN_FACTOR: f64 = 1.05;
const DEFAULT_FALLBACK_DELAY_MS: u64 = 1_000;

impl RetryConfig {
    /// Creates a default configuration with sane values.
    pub fn defaults() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            margin_factor: DEFAULT_MARGIN_FACTOR,
            fallback_delay: Duration::from_millis(DEFAULT_FALLBACK_DELAY_MS),
        }
    }

    /// Effective attempt budget; never below one.
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Applies the safety margin to a server supplied delay.
    pub fn with_margin(&self, hint: Duration) -> Duration {
        // f64::max drops NaN, so a broken factor degrades to the raw hint
        let factor = self.margin_factor.max(1.0);
        Duration::try_from_secs_f64(hint.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::defaults()
    }
}
