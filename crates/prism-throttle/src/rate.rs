use std::{fmt, num::NonZeroU32, sync::Arc, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use prism_core::{ThrottlePermit, ThrottlePolicy};

use crate::error::ThrottleError;

/// Admits at most `requests` attempts per `window`, smoothing bursts
///
/// Backed by a governor direct limiter; a full burst is available up front
/// and replenishes one slot every `window / requests`.
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<DefaultDirectRateLimiter>,
    requests: u32,
    window: Duration,
}

impl RateLimit {
    pub fn new(requests: u32, window: Duration) -> Result<Self, ThrottleError> {
        if window.is_zero() {
            return Err(ThrottleError::Config("rate window must be > 0".to_string()));
        }

        let burst =
            NonZeroU32::new(requests).ok_or_else(|| ThrottleError::Config("rate requests must be > 0".to_string()))?;

        // Convert to governor's quota format
        let replenish_interval = window / requests;
        let quota = Quota::with_period(replenish_interval)
            .ok_or_else(|| ThrottleError::Config("invalid rate period".to_string()))?
            .allow_burst(burst);

        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            requests,
            window,
        })
    }
}

impl fmt::Debug for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimit")
            .field("requests", &self.requests)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ThrottlePolicy for RateLimit {
    async fn acquire(&self) -> ThrottlePermit {
        if self.limiter.check().is_err() {
            tracing::debug!(requests = self.requests, window = ?self.window, "rate limit reached, waiting");
            self.limiter
                .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
                .await;
        }

        ThrottlePermit::unbounded()
    }
}
