use std::{fmt, time::Duration};

use prism_core::{ApiConfigError, RetryableError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StabilityError>;

/// Error body returned by the Stability API
///
/// Only `message` is required; any other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityErrorData {
    pub message: String,
}

/// Details of a non-2xx response
#[derive(Debug, Clone)]
pub struct ApiCallFailure {
    /// Provider message when the body parsed, the raw body otherwise
    pub message: String,
    pub status_code: u16,
    pub url: String,
    /// Request body as sent
    pub request_body: serde_json::Value,
    /// Parsed error body, if it matched [`StabilityErrorData`]
    pub data: Option<StabilityErrorData>,
    /// Wait requested by the server via `Retry-After`
    pub retry_after: Option<Duration>,
}

impl ApiCallFailure {
    /// Build the failure from a raw error body
    ///
    /// A body that is not a JSON object with a string `message` keeps its
    /// raw text as the message. An empty body falls back to the status line.
    pub fn from_response(
        status_code: u16,
        url: impl Into<String>,
        request_body: serde_json::Value,
        body: &str,
        retry_after: Option<Duration>,
    ) -> Self {
        let data = serde_json::from_str::<StabilityErrorData>(body).ok();
        let message = match data {
            Some(ref data) => data.message.clone(),
            None if body.trim().is_empty() => reqwest::StatusCode::from_u16(status_code)
                .ok()
                .and_then(|status| status.canonical_reason())
                .map_or_else(|| format!("HTTP {status_code}"), str::to_owned),
            None => body.to_owned(),
        };

        Self {
            message,
            status_code,
            url: url.into(),
            request_body,
            data,
            retry_after,
        }
    }

    /// 429 and 5xx are worth another attempt
    pub const fn is_retryable(&self) -> bool {
        self.status_code == 429 || self.status_code >= 500
    }
}

impl fmt::Display for ApiCallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stability API error ({}) at {}: {}", self.status_code, self.url, self.message)
    }
}

/// Errors produced by the Stability provider
#[derive(Debug, Error)]
pub enum StabilityError {
    /// Configuration could not be resolved (e.g. missing API key)
    #[error(transparent)]
    Config(#[from] ApiConfigError),

    /// The request never produced an HTTP response
    #[error("Connection error calling {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-2xx status
    #[error("{0}")]
    Http(Box<ApiCallFailure>),

    /// A 2xx body did not match the expected response shape
    #[error("Failed to parse response from {url}: {reason}")]
    ResponseParse { url: String, reason: String, body: String },

    /// The request body could not be encoded
    #[error("Failed to encode request body: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    /// The caller cancelled the call
    #[error("Call cancelled")]
    Cancelled,
}

impl StabilityError {
    /// HTTP status of the failed response, if there was one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(failure) => Some(failure.status_code),
            _ => None,
        }
    }
}

impl RetryableError for StabilityError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => !source.is_builder(),
            Self::Http(failure) => failure.is_retryable(),
            Self::Config(_) | Self::ResponseParse { .. } | Self::InvalidRequest(_) | Self::Cancelled => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Http(failure) => failure.retry_after,
            _ => None,
        }
    }

    fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    fn cancelled() -> Self {
        Self::Cancelled
    }
}
