//! Logging initialization for logship.
//!
//! Configures `tracing-subscriber` from the `[general]` section of
//! `LogshipConfig`. All diagnostics go to stderr so that stdout stays
//! reserved for the console outputs.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use logship_core::config::GeneralConfig;

/// Build the level filter. `RUST_LOG` takes precedence over `config.log_level`.
fn env_filter(config: &GeneralConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines (default)
/// * `"pretty"` - Human-readable multi-line output
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let format = config.log_format.as_str();
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let installed = match format {
        "json" => registry.with(layer.json()).try_init(),
        "pretty" => registry.with(layer.pretty()).try_init(),
        other => {
            return Err(anyhow!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            ));
        }
    };

    installed.map_err(|e| anyhow!("failed to initialize {format} tracing subscriber: {e}"))
}
