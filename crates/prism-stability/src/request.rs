use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    prompt::TextPrompt,
    types::{Sampler, StabilityImageGenerationSettings, StylePreset},
};

/// Wire body for `POST /generation/{engine}/text-to-image`
///
/// Unset options are left out of the JSON entirely rather than sent as
/// `null`.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct TextToImageRequest<'a> {
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub text_prompts: &'a [TextPrompt],
    pub cfg_scale: Option<f64>,
    pub clip_guidance_preset: Option<&'a str>,
    pub sampler: Option<Sampler>,
    pub samples: Option<u32>,
    pub seed: Option<u64>,
    pub steps: Option<u32>,
    pub style_preset: Option<StylePreset>,
}

/// Map settings and a prompt onto the request body
///
/// A non-finite `cfg_scale` has no JSON form and is left out like an unset
/// one.
pub fn build_request_body<'a>(
    settings: &'a StabilityImageGenerationSettings,
    prompt: &'a [TextPrompt],
) -> TextToImageRequest<'a> {
    TextToImageRequest {
        height: settings.height,
        width: settings.width,
        text_prompts: prompt,
        cfg_scale: settings.cfg_scale.filter(|scale| scale.is_finite()),
        clip_guidance_preset: settings.clip_guidance_preset.as_deref(),
        sampler: settings.sampler,
        samples: settings.samples,
        seed: settings.seed,
        steps: settings.steps,
        style_preset: settings.style_preset,
    }
}
