use std::future::Future;

use crate::{context::CallOptions, error::RetryableError, retry::RetryPolicy, throttle::ThrottlePolicy};

/// Run `call` under a retry policy, gating every attempt with a throttle
///
/// Attempts run sequentially. Each attempt first waits for a throttle
/// permit and keeps it until the attempt finishes. Cancellation is
/// checked before every attempt and raced against the throttle wait, the
/// attempt itself and the backoff sleep; dropping the attempt future
/// aborts an in-flight request. Once retries are exhausted the last
/// error is returned unchanged.
///
/// # Errors
///
/// Returns the error of the final attempt, or `E::cancelled()` when the
/// caller's token fires
pub async fn call_with_retry_and_throttle<T, E, F, Fut>(
    retry: &dyn RetryPolicy,
    throttle: &dyn ThrottlePolicy,
    options: &CallOptions,
    mut call: F,
) -> Result<T, E>
where
    E: RetryableError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);

        let attempt_future = async {
            let _permit = throttle.acquire().await;
            call().await
        };

        let error = match cancellable(options, attempt_future).await {
            Some(Ok(value)) => return Ok(value),
            Some(Err(error)) => error,
            None => {
                tracing::debug!(attempt, function_id = ?options.function_id, "call cancelled");
                return Err(E::cancelled());
            }
        };

        if error.is_cancelled() {
            return Err(error);
        }

        let Some(delay) = retry.next_delay(attempt, &error) else {
            if attempt > 1 {
                tracing::debug!(attempts = attempt, error = %error, "giving up after retries");
            }
            return Err(error);
        };

        tracing::warn!(
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            function_id = ?options.function_id,
            error = %error,
            "retrying upstream call after transient failure"
        );

        if cancellable(options, tokio::time::sleep(delay)).await.is_none() {
            tracing::debug!(attempt, "call cancelled during backoff");
            return Err(E::cancelled());
        }
    }
}

/// Drive `future` unless the caller's token fires first
async fn cancellable<F: Future>(options: &CallOptions, future: F) -> Option<F::Output> {
    match options.cancellation.as_ref() {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => None,
            output = future => Some(output),
        },
        None => Some(future.await),
    }
}
