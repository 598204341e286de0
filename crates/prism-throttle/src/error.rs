use thiserror::Error;

/// Throttle construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThrottleError {
    /// Configuration error
    #[error("throttle configuration error: {0}")]
    Config(String),
}
