use async_trait::async_trait;
use prism_core::{
    ApiConfigurationOptions, CallOptions, ImageGeneration, ImageGenerationModel, PromptTemplate, PromptTemplateImageModel,
    call_with_retry_and_throttle,
};
use serde_json::{Map, Value};

use crate::{
    api::{PROVIDER, post_text_to_image, text_to_image_url},
    error::{Result, StabilityError},
    facade::configuration,
    prompt::{BasicTextPromptTemplate, StabilityImageGenerationPrompt, TextPrompt, map_basic_prompt_to_stability_format},
    request::build_request_body,
    types::{StabilityImageGenerationResponse, StabilityImageGenerationSettings, StabilityImageGenerationSettingsUpdate},
};

/// Text-to-image model backed by the Stability REST API
///
/// # Example
///
/// ```no_run
/// use prism_core::{CallOptions, ImageGenerationModel};
/// use prism_stability::{StabilityImageGenerationSettings, TextPrompt, image_generator};
///
/// # async fn run() -> Result<(), prism_stability::StabilityError> {
/// let model = image_generator(
///     StabilityImageGenerationSettings::new("stable-diffusion-512-v2-1")
///         .with_cfg_scale(7.0)
///         .with_clip_guidance_preset("FAST_BLUE")
///         .with_size(512, 512)
///         .with_samples(1)
///         .with_steps(30),
/// );
///
/// let _image = model
///     .generate(
///         vec![
///             TextPrompt::new("the wicked witch of the west"),
///             TextPrompt::weighted("style of early 19th century painting", 0.5),
///         ],
///         &CallOptions::new(),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StabilityImageGenerationModel {
    settings: StabilityImageGenerationSettings,
}

impl StabilityImageGenerationModel {
    pub const fn new(settings: StabilityImageGenerationSettings) -> Self {
        Self { settings }
    }

    pub const fn settings(&self) -> &StabilityImageGenerationSettings {
        &self.settings
    }

    /// Call the text-to-image endpoint and return the parsed response
    ///
    /// Without an explicit API configuration in the settings, one is
    /// resolved from the environment first, which fails before any
    /// network I/O when no key is available.
    pub async fn call_api(&self, prompt: &[TextPrompt], options: &CallOptions) -> Result<StabilityImageGenerationResponse> {
        let resolved;
        let api = match self.settings.api {
            Some(ref api) => api,
            None => {
                resolved = configuration(ApiConfigurationOptions::new())?;
                &resolved
            }
        };

        let url = text_to_image_url(api, self.settings.model.as_str())?;
        let body = serde_json::to_value(build_request_body(&self.settings, prompt))?;

        tracing::debug!(
            provider = PROVIDER,
            model = %self.settings.model,
            url = %url,
            fragments = prompt.len(),
            function_id = ?options.function_id,
            "sending text-to-image request"
        );

        call_with_retry_and_throttle(api.retry(), api.throttle(), options, || {
            post_text_to_image(api, &url, &body)
        })
        .await
    }

    /// Accept plain text instead of weighted fragments
    pub fn with_text_prompt(self) -> PromptTemplateImageModel<Self, BasicTextPromptTemplate> {
        self.bind_prompt_template(map_basic_prompt_to_stability_format())
    }

    /// Accept whatever `template` takes as input
    pub fn with_prompt_template<T>(self, template: T) -> PromptTemplateImageModel<Self, T>
    where
        T: PromptTemplate<Output = StabilityImageGenerationPrompt> + Clone,
        T::Input: Send + 'static,
    {
        self.bind_prompt_template(template)
    }
}

fn insert_opt<T: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.insert(key.to_owned(), value.into());
    }
}

#[async_trait]
impl ImageGenerationModel for StabilityImageGenerationModel {
    type Prompt = StabilityImageGenerationPrompt;
    type SettingsUpdate = StabilityImageGenerationSettingsUpdate;
    type Response = StabilityImageGenerationResponse;
    type Error = StabilityError;

    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn model_name(&self) -> String {
        self.settings.model.to_string()
    }

    /// Allow-listed settings; the API configuration only contributes its
    /// base URL, never headers or keys
    fn settings_for_event(&self) -> Map<String, Value> {
        let settings = &self.settings;
        let mut map = Map::new();

        insert_opt(&mut map, "base_url", settings.api.as_ref().map(|api| api.base_url().to_string()));
        insert_opt(&mut map, "height", settings.height);
        insert_opt(&mut map, "width", settings.width);
        insert_opt(&mut map, "cfg_scale", settings.cfg_scale);
        insert_opt(&mut map, "clip_guidance_preset", settings.clip_guidance_preset.clone());
        insert_opt(&mut map, "sampler", settings.sampler.map(|s| s.to_string()));
        insert_opt(&mut map, "samples", settings.samples);
        insert_opt(&mut map, "seed", settings.seed);
        insert_opt(&mut map, "steps", settings.steps);
        insert_opt(&mut map, "style_preset", settings.style_preset.map(|s| s.to_string()));

        map
    }

    async fn generate(
        &self,
        prompt: Self::Prompt,
        options: &CallOptions,
    ) -> Result<ImageGeneration<Self::Response>> {
        let response = self.call_api(&prompt, options).await?;
        let base64_images = response.artifacts.iter().map(|a| a.base64.clone()).collect::<Vec<_>>();

        tracing::debug!(
            provider = PROVIDER,
            model = %self.settings.model,
            images = base64_images.len(),
            "text-to-image request complete"
        );

        Ok(ImageGeneration { response, base64_images })
    }

    fn with_settings(&self, update: Self::SettingsUpdate) -> Self {
        Self::new(self.settings.merged(update))
    }
}
