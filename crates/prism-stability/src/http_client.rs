use std::{sync::OnceLock, time::Duration};

use reqwest::Client;

/// Process-wide HTTP client so every call shares one connection pool
pub fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            Client::builder()
                // Large models can take a while to render several samples
                .timeout(Duration::from_secs(120))
                .pool_idle_timeout(Some(Duration::from_secs(30)))
                .tcp_nodelay(true)
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .build()
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "failed to build tuned HTTP client, using defaults");
                    Client::new()
                })
        })
        .clone()
}
