use std::sync::Arc;

use async_trait::async_trait;
use prism_core::{ThrottlePermit, ThrottlePolicy};
use tokio::sync::Semaphore;

use crate::error::ThrottleError;

/// Caps the number of attempts in flight at once
///
/// Each attempt holds one semaphore slot until its permit is dropped.
#[derive(Debug, Clone)]
pub struct MaxConcurrency {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl MaxConcurrency {
    pub fn new(limit: usize) -> Result<Self, ThrottleError> {
        if limit == 0 {
            return Err(ThrottleError::Config("max concurrency limit must be > 0".to_string()));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        })
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[async_trait]
impl ThrottlePolicy for MaxConcurrency {
    async fn acquire(&self) -> ThrottlePermit {
        // The semaphore is never closed, so acquisition only fails after drop
        match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => ThrottlePermit::from_semaphore(permit),
            Err(_) => ThrottlePermit::unbounded(),
        }
    }
}
