use std::{fmt, time::Duration};

use prism_config::RetryConfig;
use rand::Rng;

use crate::error::RetryableError;

/// Decides whether and when a failed attempt is retried
pub trait RetryPolicy: Send + Sync + fmt::Debug {
    /// Delay before the next attempt, or `None` to give up
    ///
    /// `attempt` is the number of attempts already made, starting at 1.
    fn next_delay(&self, attempt: u32, error: &dyn RetryableError) -> Option<Duration>;
}

/// Never retry; every failure surfaces immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn next_delay(&self, _attempt: u32, _error: &dyn RetryableError) -> Option<Duration> {
        None
    }
}

/// Exponential backoff over a bounded number of attempts
///
/// The delay after attempt `n` is `initial_delay * backoff_factor^(n - 1)`,
/// capped by `max_delay`. A server-supplied `Retry-After` wins when it
/// asks for a longer wait, but never beyond `max_delay`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    max_tries: u32,
    initial_delay: Duration,
    backoff_factor: f64,
    max_delay: Option<Duration>,
    jitter: bool,
}

impl ExponentialBackoff {
    /// Backoff with the default settings (3 tries, 2s initial delay, factor 2)
    pub fn new() -> Self {
        Self::from(&RetryConfig::default())
    }

    /// Total attempts including the first
    #[must_use]
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries.max(1);
        self
    }

    /// Delay before the second attempt
    #[must_use]
    pub const fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Growth factor between consecutive delays
    #[must_use]
    pub const fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Upper bound for a single delay
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Enable or disable random jitter
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total attempts including the first
    pub const fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Delay after `attempt` attempts, before jitter and `Retry-After`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);

        self.max_delay.map_or(delay, |cap| delay.min(cap))
    }

    fn add_jitter(delay: Duration) -> Duration {
        let fraction = rand::rng().random_range(0.0..=0.1);
        delay.checked_add(delay.mul_f64(fraction)).unwrap_or(delay)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&RetryConfig> for ExponentialBackoff {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_tries: config.max_tries.max(1),
            initial_delay: config.initial_delay,
            backoff_factor: config.backoff_factor,
            max_delay: config.max_delay,
            jitter: config.jitter,
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32, error: &dyn RetryableError) -> Option<Duration> {
        if attempt >= self.max_tries || !error.is_retryable() {
            return None;
        }

        let computed = self.delay_for(attempt);
        let computed = if self.jitter { Self::add_jitter(computed) } else { computed };

        let delay = error.retry_after().map_or(computed, |requested| requested.max(computed));

        Some(self.max_delay.map_or(delay, |cap| delay.min(cap)))
    }
}
