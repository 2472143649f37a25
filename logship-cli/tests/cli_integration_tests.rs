//! Integration tests for configuration layering, input shipping and
//! metrics endpoint installation.

use std::io::Write;

use clap::Parser;
use serial_test::serial;

use logship_cli::cli::LogshipCli;
use logship_cli::error::CliError;
use logship_cli::{metrics_server, resolve_config, shipper};
use logship_core::config::{MetricsConfig, OutputKind, ParserKind};
use logship_publisher::{PlainConsolePublisher, Publisher};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
#[serial]
async fn test_flags_override_file_and_env() {
    let file = write_config(
        r#"
[publisher]
output = "honeycomb"
parser = "json"

[telemetry]
write_key = "from-file"
dataset = "file-dataset"
"#,
    );

    // SAFETY: env is only mutated from #[serial] tests
    unsafe { std::env::set_var("LOGSHIP_TELEMETRY_DATASET", "env-dataset") };

    let path = file.path().to_str().unwrap();
    let cli = LogshipCli::try_parse_from([
        "logship",
        "--config",
        path,
        "--write-key",
        "from-flag",
        "--parser",
        "plain",
    ])
    .unwrap();
    let result = resolve_config(&cli).await;

    unsafe { std::env::remove_var("LOGSHIP_TELEMETRY_DATASET") };

    let config = result.unwrap();
    assert_eq!(config.telemetry.write_key, "from-flag");
    assert_eq!(config.telemetry.dataset, "env-dataset");
    assert_eq!(config.publisher.parser, ParserKind::Plain);
    assert_eq!(config.publisher.output, OutputKind::Honeycomb);
}

#[tokio::test]
#[serial]
async fn test_write_key_from_flag_satisfies_validation() {
    // A write key missing from the file can be supplied by flag.
    let file = write_config("[telemetry]\ndataset = \"rds\"\n");
    let path = file.path().to_str().unwrap();

    let without = LogshipCli::try_parse_from(["logship", "-c", path]).unwrap();
    let err = resolve_config(&without).await.unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
    assert_eq!(err.exit_code(), 2);

    let with = LogshipCli::try_parse_from(["logship", "-c", path, "--write-key", "k"]).unwrap();
    assert!(resolve_config(&with).await.is_ok());
}

#[tokio::test]
#[serial]
async fn test_stdout_output_needs_no_credentials() {
    let cli = LogshipCli::try_parse_from(["logship", "--output", "stdout"]).unwrap();
    let config = resolve_config(&cli).await.unwrap();
    assert_eq!(config.publisher.output, OutputKind::Stdout);
}

#[tokio::test]
#[serial]
async fn test_missing_config_file_is_config_error() {
    let cli =
        LogshipCli::try_parse_from(["logship", "-c", "/nonexistent/logship.toml"]).unwrap();
    let err = resolve_config(&cli).await.unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_ship_file_to_publisher() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    input.write_all(b"first\nsecond\n\nthird\n").unwrap();

    let reader = shipper::open_input(Some(input.path())).await.unwrap();
    let mut publisher = PlainConsolePublisher::new(Vec::new());

    let stats = shipper::ship(reader, &mut publisher, 2, std::future::pending())
        .await
        .unwrap();
    Publisher::close(&mut publisher).await.unwrap();

    assert_eq!(stats.lines, 4);
    assert_eq!(stats.chunks, 2);
    assert_eq!(publisher.into_inner(), b"first\nsecond\n\nthird\n");
}

#[tokio::test]
async fn test_ship_file_with_stray_bytes_keeps_going() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    input.write_all(b"good1\nbad\xff\ngood2\n").unwrap();

    let reader = shipper::open_input(Some(input.path())).await.unwrap();
    let mut publisher = PlainConsolePublisher::new(Vec::new());

    let stats = shipper::ship(reader, &mut publisher, 1, std::future::pending())
        .await
        .unwrap();
    Publisher::close(&mut publisher).await.unwrap();

    assert_eq!(stats.invalid_utf8, 1);
    let output = String::from_utf8(publisher.into_inner()).unwrap();
    assert!(output.ends_with("good2\n"), "output = {output:?}");
}

#[tokio::test]
async fn test_open_missing_input_fails() {
    let result = shipper::open_input(Some(std::path::Path::new("/nonexistent/slow.log"))).await;
    let err: CliError = result.err().unwrap().into();
    assert_eq!(err.exit_code(), 10);
}

#[tokio::test]
#[serial]
async fn test_install_metrics_recorder_rejects_invalid_address() {
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "999.999.999.999".to_owned(),
        port: 9464,
    };
    assert!(metrics_server::install_metrics_recorder(&config).is_err());
}

#[tokio::test]
#[serial]
async fn test_install_metrics_recorder_succeeds() {
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "127.0.0.1".to_owned(),
        port: 19464,
    };
    let result = metrics_server::install_metrics_recorder(&config);
    assert!(result.is_ok(), "install failed: {:?}", result.err());
}
