use std::time::Duration;

use serde::Deserialize;

/// Admission policy applied to every upstream attempt
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThrottleConfig {
    /// No throttling
    #[default]
    None,
    /// Cap the number of in-flight requests
    MaxConcurrency {
        /// Maximum simultaneous requests
        limit: usize,
    },
    /// Cap the request rate
    Rate {
        /// Maximum requests per window
        requests: u32,
        /// Window duration (e.g. "1s", "1m")
        #[serde(deserialize_with = "duration_str::deserialize_duration")]
        window: Duration,
    },
}
