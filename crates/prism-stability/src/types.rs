use std::{convert::Infallible, fmt, str::FromStr};

use prism_core::ApiConfiguration;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumIter, EnumString};

/// Stability engine id
///
/// Known engines get their own variant; anything else is kept verbatim so
/// newly released engines work without a crate update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum StabilityModel {
    StableDiffusionV1_5,
    StableDiffusion512V2_1,
    StableDiffusionXl1024V0_9,
    StableDiffusionXl1024V1_0,
    Custom(String),
}

impl StabilityModel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::StableDiffusionV1_5 => "stable-diffusion-v1-5",
            Self::StableDiffusion512V2_1 => "stable-diffusion-512-v2-1",
            Self::StableDiffusionXl1024V0_9 => "stable-diffusion-xl-1024-v0-9",
            Self::StableDiffusionXl1024V1_0 => "stable-diffusion-xl-1024-v1-0",
            Self::Custom(id) => id,
        }
    }
}

impl fmt::Display for StabilityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StabilityModel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "stable-diffusion-v1-5" => Self::StableDiffusionV1_5,
            "stable-diffusion-512-v2-1" => Self::StableDiffusion512V2_1,
            "stable-diffusion-xl-1024-v0-9" => Self::StableDiffusionXl1024V0_9,
            "stable-diffusion-xl-1024-v1-0" => Self::StableDiffusionXl1024V1_0,
            other => Self::Custom(other.to_owned()),
        })
    }
}

impl From<&str> for StabilityModel {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl From<String> for StabilityModel {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// Diffusion sampler
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, SerializeDisplay, DeserializeFromStr,
)]
pub enum Sampler {
    #[strum(serialize = "DDIM")]
    Ddim,
    #[strum(serialize = "DDPM")]
    Ddpm,
    #[strum(serialize = "K_DPMPP_2M")]
    KDpmpp2m,
    #[strum(serialize = "K_DPMPP_2S_ANCESTRAL")]
    KDpmpp2sAncestral,
    #[strum(serialize = "K_DPM_2")]
    KDpm2,
    #[strum(serialize = "K_DPM_2_ANCESTRAL")]
    KDpm2Ancestral,
    #[strum(serialize = "K_EULER")]
    KEuler,
    #[strum(serialize = "K_EULER_ANCESTRAL")]
    KEulerAncestral,
    #[strum(serialize = "K_HEUN")]
    KHeun,
    #[strum(serialize = "K_LMS")]
    KLms,
}

/// Style preset guiding the image towards a look
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, SerializeDisplay, DeserializeFromStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum StylePreset {
    Enhance,
    Anime,
    Photographic,
    DigitalArt,
    ComicBook,
    FantasyArt,
    LineArt,
    AnalogFilm,
    NeonPunk,
    Isometric,
    LowPoly,
    Origami,
    ModelingCompound,
    Cinematic,
    #[strum(serialize = "3d-model")]
    ThreeDModel,
    PixelArt,
    TileTexture,
}

/// Settings for a Stability text-to-image model
///
/// Unset options are omitted from the request so the API applies its own
/// defaults.
#[derive(Debug, Clone)]
pub struct StabilityImageGenerationSettings {
    /// Engine to call
    pub model: StabilityModel,
    /// Connection settings; resolved from the environment when unset
    pub api: Option<ApiConfiguration>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    /// How strictly the diffusion follows the prompt
    pub cfg_scale: Option<f64>,
    /// e.g. `FAST_BLUE`, `NONE`
    pub clip_guidance_preset: Option<String>,
    pub sampler: Option<Sampler>,
    /// Number of images to generate
    pub samples: Option<u32>,
    pub seed: Option<u64>,
    pub steps: Option<u32>,
    pub style_preset: Option<StylePreset>,
}

impl StabilityImageGenerationSettings {
    pub fn new(model: impl Into<StabilityModel>) -> Self {
        Self {
            model: model.into(),
            api: None,
            height: None,
            width: None,
            cfg_scale: None,
            clip_guidance_preset: None,
            sampler: None,
            samples: None,
            seed: None,
            steps: None,
            style_preset: None,
        }
    }

    #[must_use]
    pub fn with_api(mut self, api: ApiConfiguration) -> Self {
        self.api = Some(api);
        self
    }

    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    #[must_use]
    pub const fn with_cfg_scale(mut self, cfg_scale: f64) -> Self {
        self.cfg_scale = Some(cfg_scale);
        self
    }

    #[must_use]
    pub fn with_clip_guidance_preset(mut self, preset: impl Into<String>) -> Self {
        self.clip_guidance_preset = Some(preset.into());
        self
    }

    #[must_use]
    pub const fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    #[must_use]
    pub const fn with_samples(mut self, samples: u32) -> Self {
        self.samples = Some(samples);
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn with_steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    #[must_use]
    pub const fn with_style_preset(mut self, style_preset: StylePreset) -> Self {
        self.style_preset = Some(style_preset);
        self
    }

    /// Copy of these settings with every field set in `update` replaced
    #[must_use]
    pub fn merged(&self, update: StabilityImageGenerationSettingsUpdate) -> Self {
        Self {
            model: update.model.unwrap_or_else(|| self.model.clone()),
            api: update.api.or_else(|| self.api.clone()),
            height: update.height.or(self.height),
            width: update.width.or(self.width),
            cfg_scale: update.cfg_scale.or(self.cfg_scale),
            clip_guidance_preset: update
                .clip_guidance_preset
                .or_else(|| self.clip_guidance_preset.clone()),
            sampler: update.sampler.or(self.sampler),
            samples: update.samples.or(self.samples),
            seed: update.seed.or(self.seed),
            steps: update.steps.or(self.steps),
            style_preset: update.style_preset.or(self.style_preset),
        }
    }
}

/// Partial settings for [`StabilityImageGenerationSettings::merged`]; unset
/// fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct StabilityImageGenerationSettingsUpdate {
    pub model: Option<StabilityModel>,
    pub api: Option<ApiConfiguration>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub cfg_scale: Option<f64>,
    pub clip_guidance_preset: Option<String>,
    pub sampler: Option<Sampler>,
    pub samples: Option<u32>,
    pub seed: Option<u64>,
    pub steps: Option<u32>,
    pub style_preset: Option<StylePreset>,
}

/// Why the engine stopped producing an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Success,
    Error,
    ContentFiltered,
}

/// One generated image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityArtifact {
    /// PNG bytes, base64 encoded
    pub base64: String,
    pub seed: u64,
    #[serde(rename = "finishReason")]
    pub finish_reason: FinishReason,
}

/// Successful text-to-image response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityImageGenerationResponse {
    pub artifacts: Vec<StabilityArtifact>,
}
