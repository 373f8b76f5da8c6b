//! Retry budget for linked-tool invocations.
//!
//! Linked tools are the only collaborator that is retried. Removal
//! commands, validation commands and git operations run exactly once and
//! a failure there is final.
//!
//! ```yaml
//! linked_tools:
//!   retry:
//!     enabled: true
//!     max_retries: 3
//!     base_delay_ms: 100
//!     strategy: exponential
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration for linked-tool calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Enable retries (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum number of attempts, first call included (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between attempts in milliseconds (default: 100)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Delay growth between attempts (default: exponential)
    #[serde(default)]
    pub strategy: RetryStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            strategy: RetryStrategy::default(),
        }
    }
}

impl RetryConfig {
    /// A config that makes exactly one attempt.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Total attempts allowed, never less than one.
    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_retries.max(1)
        } else {
            1
        }
    }

    /// Delay to wait before retry number `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms;
        let ms = match self.strategy {
            RetryStrategy::Constant => base,
            RetryStrategy::Linear => base.saturating_mul(attempt as u64),
            RetryStrategy::Exponential => {
                base.saturating_mul(1u64 << attempt.saturating_sub(1).min(16))
            }
        };
        Duration::from_millis(ms)
    }

    /// Run `attempt_fn` until it succeeds or the attempt budget is spent.
    ///
    /// Returns the final result together with the number of attempts made.
    pub fn run<T, E>(&self, mut attempt_fn: impl FnMut(u32) -> Result<T, E>) -> (Result<T, E>, u32) {
        let max = self.max_attempts();
        let mut attempt = 1;
        loop {
            match attempt_fn(attempt) {
                Ok(value) => return (Ok(value), attempt),
                Err(err) if attempt >= max => return (Err(err), attempt),
                Err(_) => {
                    std::thread::sleep(self.delay_for_attempt(attempt));
                    attempt += 1;
                }
            }
        }
    }
}

/// Retry delay strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    /// Same delay between each retry.
    Constant,
    /// Delay increases linearly: base * attempt.
    Linear,
    /// Delay doubles each attempt: base * 2^(attempt-1).
    #[default]
    Exponential,
}

fn default_enabled() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    100
}
