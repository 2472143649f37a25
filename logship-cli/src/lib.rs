//! logship command-line front end.
//!
//! This library exposes the binary's modules for integration testing.
//! In production, `logship` is used as a binary (main.rs).

pub mod cli;
pub mod error;
pub mod logging;
pub mod metrics_server;
pub mod shipper;

use logship_core::config::LogshipConfig;

use crate::cli::LogshipCli;
use crate::error::CliError;

/// Build the effective configuration.
///
/// Precedence, lowest to highest: defaults, config file,
/// `LOGSHIP_*` environment variables, command-line flags.
/// The result is validated once all layers are applied.
pub async fn resolve_config(cli: &LogshipCli) -> Result<LogshipConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => LogshipConfig::from_file(path).await?,
        None => LogshipConfig::default(),
    };
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}
