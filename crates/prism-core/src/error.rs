use std::time::Duration;

/// Classification the retry loop needs from a provider's error type
///
/// Implemented by each provider crate's error enum so the generic call
/// executor can decide between retrying, giving up, and reporting a
/// cancellation without knowing the concrete variants.
pub trait RetryableError: std::error::Error + Send + Sync + 'static {
    /// Whether another attempt may succeed (transport failures, 429, 5xx)
    fn is_retryable(&self) -> bool;

    /// Server-requested wait before the next attempt, if any
    fn retry_after(&self) -> Option<Duration> {
        None
    }

    /// Whether this error represents a caller-triggered cancellation
    fn is_cancelled(&self) -> bool;

    /// Construct the cancellation error
    fn cancelled() -> Self
    where
        Self: Sized;
}
