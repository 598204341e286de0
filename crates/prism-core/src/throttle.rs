use std::fmt;

use async_trait::async_trait;
use tokio::sync::OwnedSemaphorePermit;

/// Admission gate wrapped around every upstream attempt
///
/// The permit returned by [`ThrottlePolicy::acquire`] is held for the
/// duration of one attempt and released when dropped.
#[async_trait]
pub trait ThrottlePolicy: Send + Sync + fmt::Debug {
    /// Wait until an attempt may start
    async fn acquire(&self) -> ThrottlePermit;
}

/// Proof of admission; dropping it frees the slot
#[derive(Debug, Default)]
pub struct ThrottlePermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl ThrottlePermit {
    /// Permit that holds no resource
    pub const fn unbounded() -> Self {
        Self { _permit: None }
    }

    /// Permit backed by a semaphore slot
    pub const fn from_semaphore(permit: OwnedSemaphorePermit) -> Self {
        Self { _permit: Some(permit) }
    }
}

/// Admit every attempt immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct Unthrottled;

#[async_trait]
impl ThrottlePolicy for Unthrottled {
    async fn acquire(&self) -> ThrottlePermit {
        ThrottlePermit::unbounded()
    }
}
