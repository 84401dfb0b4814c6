use std::time::Duration;

use quizbench::RetryConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: usize,
    pub margin_factor: f64,
    pub fallback_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let defaults = RetryConfig::defaults();
        Self {
            max_attempts: defaults.max_attempts,
            margin_factor: defaults.margin_factor,
            fallback_delay_ms: defaults.fallback_delay.as_millis() as u64,
        }
    }
}

impl RetrySection {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            margin_factor: self.margin_factor,
            fallback_delay: Duration::from_millis(self.fallback_delay_ms),
        }
    }
}
