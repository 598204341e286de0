use std::path::Path;

use anyhow::Context;
use prism_config::Config;
use prism_core::{ApiConfigError, ApiConfiguration, ApiConfigurationOptions};

use crate::{api::STABILITY_DEFAULTS, model::StabilityImageGenerationModel, types::StabilityImageGenerationSettings};

/// Resolve a Stability API configuration
///
/// Unset options fall back to `https://api.stability.ai:443/v1` and the
/// `STABILITY_API_KEY` environment variable.
pub fn configuration(options: ApiConfigurationOptions) -> Result<ApiConfiguration, ApiConfigError> {
    ApiConfiguration::resolve(&STABILITY_DEFAULTS, options)
}

/// Build a configuration, including retry and throttle policies, from a
/// parsed config file
pub fn configuration_from_config(config: &Config) -> anyhow::Result<ApiConfiguration> {
    let throttle = prism_throttle::create_throttle(&config.throttle).context("invalid throttle configuration")?;
    let options = ApiConfigurationOptions::from_config(&config.api, config.retry.as_ref()).with_throttle(throttle);

    Ok(configuration(options)?)
}

/// Load a TOML config file and build a configuration from it
pub fn configuration_from_file(path: &Path) -> anyhow::Result<ApiConfiguration> {
    let config = Config::load(path)?;

    configuration_from_config(&config).with_context(|| format!("failed to configure Stability API from {}", path.display()))
}

/// Create a text-to-image model
pub const fn image_generator(settings: StabilityImageGenerationSettings) -> StabilityImageGenerationModel {
    StabilityImageGenerationModel::new(settings)
}
