//! logship.toml 통합 설정 테스트
//!
//! - logship.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 파일 로딩 + 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use logship_core::config::{LogshipConfig, OutputKind, ParserKind};
use logship_core::error::{ConfigError, LogshipError};
use serial_test::serial;

// =============================================================================
// logship.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../logship.toml.example");
    let config = LogshipConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.publisher.output, OutputKind::Honeycomb);
    assert_eq!(config.publisher.parser, ParserKind::Json);
    assert!(config.publisher.scrub_query);
    assert_eq!(config.publisher.extra_fields["env"], "prod");
    assert_eq!(config.telemetry.batch_size, 50);
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../logship.toml.example");
    let config = LogshipConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

// =============================================================================
// 부분 설정
// =============================================================================

#[test]
fn partial_config_fills_defaults() {
    let config = LogshipConfig::parse(
        r#"
        [telemetry]
        write_key = "abc"
        dataset = "postgres"
        "#,
    )
    .expect("should parse");

    assert_eq!(config.telemetry.dataset, "postgres");
    assert_eq!(config.telemetry.api_host, "https://api.honeycomb.io/");
    assert_eq!(config.publisher.line_capacity, 256);
    config.validate().expect("partial config should be valid");
}

#[test]
fn malformed_toml_is_parse_error() {
    let err = LogshipConfig::parse("[publisher\noutput = ").unwrap_err();
    assert!(matches!(
        err,
        LogshipError::Config(ConfigError::ParseFailed { .. })
    ));
}

// =============================================================================
// 파일 로딩
// =============================================================================

#[tokio::test]
async fn missing_file_is_file_not_found() {
    let err = LogshipConfig::load("/nonexistent/logship.toml")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LogshipError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
#[serial]
async fn env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logship.toml");
    std::fs::write(
        &path,
        "[publisher]\noutput = \"json\"\n[telemetry]\ndataset = \"from-file\"\n",
    )
    .unwrap();

    // SAFETY: serial 테스트에서만 환경변수를 변경
    unsafe {
        std::env::set_var("LOGSHIP_TELEMETRY_DATASET", "from-env");
    }
    let result = LogshipConfig::load(&path).await;
    unsafe {
        std::env::remove_var("LOGSHIP_TELEMETRY_DATASET");
    }

    let config = result.expect("config should load");
    assert_eq!(config.publisher.output, OutputKind::Json);
    assert_eq!(config.telemetry.dataset, "from-env");
}

#[tokio::test]
#[serial]
async fn load_validates_after_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logship.toml");
    std::fs::write(&path, "[publisher]\noutput = \"stdout\"\n").unwrap();

    unsafe {
        std::env::set_var("LOGSHIP_PUBLISHER_OUTPUT", "honeycomb");
    }
    let result = LogshipConfig::load(&path).await;
    unsafe {
        std::env::remove_var("LOGSHIP_PUBLISHER_OUTPUT");
    }

    // honeycomb 출력인데 write_key가 없으므로 검증 실패
    assert!(result.is_err());
}
