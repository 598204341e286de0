//! Provider-independent building blocks: configuration resolution, the
//! retrying and throttled call executor, and the model traits every
//! provider crate implements.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod api_config;
pub mod call;
pub mod context;
pub mod error;
pub mod model;
pub mod retry;
pub mod throttle;

pub use api_config::{
    ApiConfigError, ApiConfiguration, ApiConfigurationOptions, ApiDefaults, BaseUrlOverride, BaseUrlParts,
    LoadApiKeyOptions, load_api_key,
};
pub use call::call_with_retry_and_throttle;
pub use context::CallOptions;
pub use error::RetryableError;
pub use model::{ImageGeneration, ImageGenerationModel, PromptTemplate, PromptTemplateImageModel};
pub use retry::{ExponentialBackoff, NoRetry, RetryPolicy};
pub use throttle::{ThrottlePermit, ThrottlePolicy, Unthrottled};
