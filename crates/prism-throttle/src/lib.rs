#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod concurrency;
mod error;
mod rate;

use std::sync::Arc;

pub use concurrency::MaxConcurrency;
pub use error::ThrottleError;
use prism_config::ThrottleConfig;
use prism_core::{ThrottlePolicy, Unthrottled};
pub use rate::RateLimit;

/// Create a throttle policy from configuration
pub fn create_throttle(config: &ThrottleConfig) -> Result<Arc<dyn ThrottlePolicy>, ThrottleError> {
    let policy: Arc<dyn ThrottlePolicy> = match *config {
        ThrottleConfig::None => Arc::new(Unthrottled),
        ThrottleConfig::MaxConcurrency { limit } => Arc::new(MaxConcurrency::new(limit)?),
        ThrottleConfig::Rate { requests, window } => Arc::new(RateLimit::new(requests, window)?),
    };

    tracing::debug!(throttle = ?policy, "throttle policy created");

    Ok(policy)
}
