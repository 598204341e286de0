//! Stability AI text-to-image provider
//!
//! Maps weighted text prompts onto `POST /generation/{engine}/text-to-image`,
//! runs the call under the configured retry and throttle policies, and parses
//! either the artifacts or the API's error body.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod api;
mod error;
mod facade;
mod http_client;
mod model;
mod prompt;
mod request;
mod types;

pub use api::{PROVIDER, STABILITY_DEFAULTS, text_to_image_url};
pub use error::{ApiCallFailure, Result, StabilityError, StabilityErrorData};
pub use facade::{configuration, configuration_from_config, configuration_from_file, image_generator};
pub use model::StabilityImageGenerationModel;
pub use prompt::{BasicTextPromptTemplate, StabilityImageGenerationPrompt, TextPrompt, map_basic_prompt_to_stability_format};
pub use request::{TextToImageRequest, build_request_body};
pub use types::{
    FinishReason, Sampler, StabilityArtifact, StabilityImageGenerationResponse, StabilityImageGenerationSettings,
    StabilityImageGenerationSettingsUpdate, StabilityModel, StylePreset,
};
