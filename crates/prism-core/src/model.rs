use std::fmt;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{context::CallOptions, error::RetryableError};

/// Result of one image generation call
#[derive(Debug, Clone)]
pub struct ImageGeneration<R> {
    /// Parsed provider response
    pub response: R,
    /// Every generated image as base64, in response order
    pub base64_images: Vec<String>,
}

impl<R> ImageGeneration<R> {
    /// First image, for callers that asked for a single sample
    pub fn first_image(&self) -> Option<&str> {
        self.base64_images.first().map(String::as_str)
    }

    /// Decode every image into raw bytes
    ///
    /// # Errors
    ///
    /// Returns the first payload that is not valid base64
    pub fn decode_images(&self) -> Result<Vec<Vec<u8>>, base64::DecodeError> {
        self.base64_images.iter().map(|image| STANDARD.decode(image)).collect()
    }
}

/// Converts caller input into a provider prompt
pub trait PromptTemplate: Send + Sync {
    /// What the caller passes in
    type Input;
    /// What the model consumes
    type Output;

    /// Apply the template
    fn format(&self, input: Self::Input) -> Self::Output;
}

/// A configured text-to-image model
#[async_trait]
pub trait ImageGenerationModel: Send + Sync + Sized {
    /// Prompt accepted by [`Self::generate`]
    type Prompt: Send + 'static;
    /// Partial settings merged by [`Self::with_settings`]
    type SettingsUpdate;
    /// Parsed provider response
    type Response: Send;
    /// Error returned by calls
    type Error: RetryableError;

    /// Stable provider id (e.g. "stability")
    fn provider(&self) -> &'static str;

    /// Model id sent to the provider
    fn model_name(&self) -> String;

    /// Non-secret settings suitable for logs and events
    fn settings_for_event(&self) -> serde_json::Map<String, serde_json::Value>;

    /// Generate images for `prompt`
    async fn generate(
        &self,
        prompt: Self::Prompt,
        options: &CallOptions,
    ) -> Result<ImageGeneration<Self::Response>, Self::Error>;

    /// New model with `update` merged over the current settings
    #[must_use]
    fn with_settings(&self, update: Self::SettingsUpdate) -> Self;

    /// Wrap the model so it accepts the template's input instead
    fn bind_prompt_template<T>(self, template: T) -> PromptTemplateImageModel<Self, T>
    where
        T: PromptTemplate<Output = Self::Prompt> + Clone,
        T::Input: Send + 'static,
    {
        PromptTemplateImageModel::new(self, template)
    }
}

/// Model wrapper that formats its input through a prompt template first
#[derive(Clone)]
pub struct PromptTemplateImageModel<M, T> {
    model: M,
    template: T,
}

impl<M, T> PromptTemplateImageModel<M, T> {
    pub const fn new(model: M, template: T) -> Self {
        Self { model, template }
    }

    pub const fn model(&self) -> &M {
        &self.model
    }

    pub const fn template(&self) -> &T {
        &self.template
    }
}

impl<M: ImageGenerationModel, T> fmt::Debug for PromptTemplateImageModel<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptTemplateImageModel")
            .field("provider", &self.model.provider())
            .field("model", &self.model.model_name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<M, T> ImageGenerationModel for PromptTemplateImageModel<M, T>
where
    M: ImageGenerationModel,
    T: PromptTemplate<Output = M::Prompt> + Clone,
    T::Input: Send + 'static,
{
    type Prompt = T::Input;
    type SettingsUpdate = M::SettingsUpdate;
    type Response = M::Response;
    type Error = M::Error;

    fn provider(&self) -> &'static str {
        self.model.provider()
    }

    fn model_name(&self) -> String {
        self.model.model_name()
    }

    fn settings_for_event(&self) -> serde_json::Map<String, serde_json::Value> {
        self.model.settings_for_event()
    }

    async fn generate(
        &self,
        prompt: Self::Prompt,
        options: &CallOptions,
    ) -> Result<ImageGeneration<Self::Response>, Self::Error> {
        let formatted = self.template.format(prompt);
        self.model.generate(formatted, options).await
    }

    fn with_settings(&self, update: Self::SettingsUpdate) -> Self {
        Self::new(self.model.with_settings(update), self.template.clone())
    }
}
