#![allow(clippy::must_use_candidate)]

pub mod api;
mod env;
pub mod log;
mod loader;
pub mod retry;
pub mod throttle;

use serde::Deserialize;

pub use api::*;
pub use env::{ExpandError, expand_env};
pub use log::*;
pub use retry::*;
pub use throttle::*;

/// Top-level prism configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Upstream API connection settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Retry policy; the built-in backoff is used when absent
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Throttle policy
    #[serde(default)]
    pub throttle: ThrottleConfig,
    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}
