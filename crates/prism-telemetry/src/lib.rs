//! Logging setup for prism binaries and examples
//!
//! Library crates only emit `tracing` events; installing a subscriber is
//! left to the application, which calls [`init`] once at startup.

use prism_config::{LogConfig, LogFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `tracing` subscriber described by `config`
///
/// An invalid filter directive falls back to `info` rather than failing,
/// so a typo in the config never silences logging entirely.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let filter = build_filter(&config.filter);

    match config.format {
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);

            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .flatten_event(true);

            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
        }
    }

    tracing::debug!(filter = %config.filter, format = ?config.format, "logging initialised");

    Ok(())
}

fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}
