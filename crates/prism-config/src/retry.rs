use std::time::Duration;

use serde::Deserialize;

/// Retry policy for upstream calls
///
/// Omitting the `[retry]` section keeps the built-in exponential backoff.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts including the first one (1 disables retries)
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,
    /// Delay before the second attempt (e.g. "2s", "500ms")
    #[serde(default = "default_initial_delay", deserialize_with = "duration_str::deserialize_duration")]
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after every failed attempt
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Upper bound for a single delay
    #[serde(default, deserialize_with = "duration_str::deserialize_option_duration")]
    pub max_delay: Option<Duration>,
    /// Add random jitter to every delay
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_tries: default_max_tries(),
            initial_delay: default_initial_delay(),
            backoff_factor: default_backoff_factor(),
            max_delay: None,
            jitter: default_jitter(),
        }
    }
}

const fn default_max_tries() -> u32 {
    3
}

const fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

const fn default_backoff_factor() -> f64 {
    2.0
}

const fn default_jitter() -> bool {
    true
}
