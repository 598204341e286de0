use prism_core::PromptTemplate;
use serde::{Deserialize, Serialize};

/// One weighted fragment of a Stability prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPrompt {
    pub text: String,
    /// Relative influence; negative values steer away from the text
    #[serde(default, skip_serializing_if = "weight_is_unset")]
    pub weight: Option<f64>,
}

// NaN and infinities would serialize as `null`
#[allow(clippy::ref_option)]
fn weight_is_unset(weight: &Option<f64>) -> bool {
    !weight.is_some_and(f64::is_finite)
}

impl TextPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: None,
        }
    }

    pub fn weighted(text: impl Into<String>, weight: f64) -> Self {
        Self {
            text: text.into(),
            weight: Some(weight),
        }
    }
}

/// Ordered prompt fragments, sent to the API in this order
pub type StabilityImageGenerationPrompt = Vec<TextPrompt>;

/// Turns a plain description into a single unweighted fragment
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicTextPromptTemplate;

impl PromptTemplate for BasicTextPromptTemplate {
    type Input = String;
    type Output = StabilityImageGenerationPrompt;

    fn format(&self, description: String) -> StabilityImageGenerationPrompt {
        vec![TextPrompt::new(description)]
    }
}

/// Template for plain text prompts
pub const fn map_basic_prompt_to_stability_format() -> BasicTextPromptTemplate {
    BasicTextPromptTemplate
}
