use tokio_util::sync::CancellationToken;

/// Per-call options passed alongside a prompt
///
/// Cloning is cheap; the cancellation token is shared, so cancelling a
/// clone cancels every call that received the same token.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Cooperative cancellation signal for the call and its retries
    pub cancellation: Option<CancellationToken>,
    /// Caller-chosen identifier attached to log events
    pub function_id: Option<String>,
}

impl CallOptions {
    /// Options with no cancellation and no function id
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Attach a function id for log correlation
    #[must_use]
    pub fn with_function_id(mut self, function_id: impl Into<String>) -> Self {
        self.function_id = Some(function_id.into());
        self
    }

    /// Whether the attached token has already been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}
