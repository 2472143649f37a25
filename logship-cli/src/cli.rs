//! CLI argument definitions for logship.
//!
//! Uses `clap` v4 derive macros. Every flag that maps onto a config
//! field is optional and, when present, takes precedence over both the
//! config file and `LOGSHIP_*` environment variables.

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;

use logship_core::config::{LogshipConfig, OutputKind, ParserKind};

/// Ship log lines to a telemetry backend or stdout.
///
/// Reads newline-delimited text from a file (or stdin), parses each line
/// into a structured event, optionally scrubs the `query` field and adds
/// static fields, then publishes the events to the configured output.
#[derive(Parser, Debug)]
#[command(name = "logship")]
#[command(version, about, long_about = None)]
pub struct LogshipCli {
    /// Input file to read. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,

    /// Path to logship.toml configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output destination (honeycomb, stdout, json).
    #[arg(short, long)]
    pub output: Option<OutputKind>,

    /// Line parser (json, plain).
    #[arg(short, long)]
    pub parser: Option<ParserKind>,

    /// Telemetry API write key.
    #[arg(long)]
    pub write_key: Option<String>,

    /// Telemetry dataset name.
    #[arg(long)]
    pub dataset: Option<String>,

    /// Telemetry API host.
    #[arg(long)]
    pub api_host: Option<String>,

    /// Presampling rate recorded on every event.
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Replace the `query` field with its SHA-256 digest before sending.
    #[arg(long)]
    pub scrub_query: bool,

    /// Static field added to every event, as `key=value`. Repeatable.
    ///
    /// Fields parsed from the log line win over fields added here.
    #[arg(long = "add-field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub add_field: Vec<(String, String)>,

    /// Number of input lines handed to the publisher per write.
    #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_lines: u64,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without reading input.
    #[arg(long)]
    pub validate: bool,
}

impl LogshipCli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut LogshipConfig) {
        if let Some(output) = self.output {
            config.publisher.output = output;
        }
        if let Some(parser) = self.parser {
            config.publisher.parser = parser;
        }
        if self.scrub_query {
            config.publisher.scrub_query = true;
        }
        for (key, value) in &self.add_field {
            config
                .publisher
                .extra_fields
                .insert(key.clone(), Value::String(value.clone()));
        }

        if let Some(write_key) = &self.write_key {
            config.telemetry.write_key = write_key.clone();
        }
        if let Some(dataset) = &self.dataset {
            config.telemetry.dataset = dataset.clone();
        }
        if let Some(api_host) = &self.api_host {
            config.telemetry.api_host = api_host.clone();
        }
        if let Some(sample_rate) = self.sample_rate {
            config.telemetry.sample_rate = sample_rate;
        }

        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }

    /// Input path, or `None` for stdin.
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.as_os_str() != "-")
    }
}

/// Parse a `key=value` pair. The value may itself contain `=`.
pub fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("field name must not be empty in '{s}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
