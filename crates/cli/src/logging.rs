//! Logging setup
//!
//! Logs go to stderr so command output on stdout stays machine readable.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "nodeprobe=warn";

/// Install the global subscriber
///
/// # Environment Variables
///
/// - `RUST_LOG`: filter directives (default: `nodeprobe=warn`)
/// - `NODEPROBE_LOG_FORMAT`: `json` for structured lines, anything else for pretty output
pub fn init_logging(verbose: bool) -> Result<()> {
    let log_format = std::env::var("NODEPROBE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let fallback = if verbose { "nodeprobe=debug" } else { DEFAULT_FILTER };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            // Test harnesses: one JSON object per line
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to install JSON subscriber")?;
        }
        _ => {
            // Interactive use: compact human-readable lines
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to install subscriber")?;
        }
    }

    Ok(())
}
