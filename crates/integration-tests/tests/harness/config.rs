//! Programmatic configuration builder for integration tests

use std::time::Duration;

use indexmap::IndexMap;
use prism_config::{ApiConfig, Config, LogConfig, RetryConfig, ThrottleConfig};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Point the API section at a mock backend with a test key and fast retries
    pub fn new(base_url: &str) -> Self {
        Self {
            config: Config {
                api: ApiConfig {
                    base_url: Some(base_url.parse().expect("valid URL")),
                    api_key: Some(SecretString::from("test-key")),
                    headers: IndexMap::new(),
                    ..ApiConfig::default()
                },
                retry: Some(RetryConfig {
                    initial_delay: Duration::from_millis(10),
                    jitter: false,
                    ..RetryConfig::default()
                }),
                throttle: ThrottleConfig::None,
                log: LogConfig::default(),
            },
        }
    }

    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        if let Some(ref mut retry) = self.config.retry {
            retry.max_tries = max_tries;
        }
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.config.throttle = ThrottleConfig::MaxConcurrency { limit };
        self
    }

    pub fn with_rate(mut self, requests: u32, window: Duration) -> Self {
        self.config.throttle = ThrottleConfig::Rate { requests, window };
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.config.api.headers.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
