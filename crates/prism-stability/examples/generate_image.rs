//! Generate one image with the Stability API and save it as a PNG
//!
//! ```sh
//! STABILITY_API_KEY=sk-... cargo run -p prism-stability --example generate_image
//! cargo run -p prism-stability --example generate_image -- prism.toml
//! ```
//!
//! The optional argument is a prism config file; its `[api]`, `[retry]`,
//! `[throttle]` and `[log]` sections replace the defaults.

use std::path::PathBuf;

use prism_config::Config;
use prism_core::{CallOptions, ImageGenerationModel};
use prism_stability::{StabilityImageGenerationSettings, StabilityModel, TextPrompt, image_generator};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match config_path {
        Some(ref path) => Some(Config::load(path)?),
        None => None,
    };

    prism_telemetry::init(&config.as_ref().map(|c| c.log.clone()).unwrap_or_default())?;

    let mut settings = StabilityImageGenerationSettings::new(StabilityModel::StableDiffusion512V2_1)
        .with_cfg_scale(7.0)
        .with_clip_guidance_preset("FAST_BLUE")
        .with_size(512, 512)
        .with_samples(1)
        .with_steps(30);

    if let Some(ref config) = config {
        settings = settings.with_api(prism_stability::configuration_from_config(config)?);
    }

    // Ctrl+C aborts the request instead of waiting for the render
    let cancellation = CancellationToken::new();
    let trigger = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let generation = image_generator(settings)
        .generate(
            vec![
                TextPrompt::new("the wicked witch of the west"),
                TextPrompt::weighted("style of early 19th century painting", 0.5),
            ],
            &CallOptions::new()
                .with_cancellation(cancellation)
                .with_function_id("generate-image-example"),
        )
        .await?;

    for (index, image) in generation.decode_images()?.into_iter().enumerate() {
        let path = PathBuf::from(format!("image-example-{index}.png"));
        tokio::fs::write(&path, image).await?;
        tracing::info!(path = %path.display(), "image saved");
    }

    Ok(())
}
