//! 설정 관리 — logship.toml 파싱 및 런타임 설정
//!
//! [`LogshipConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGSHIP_TELEMETRY_DATASET=rds` 형식)
//! 3. 설정 파일 (`logship.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logship_core::error::LogshipError> {
//! use logship_core::config::LogshipConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogshipConfig::load("logship.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogshipConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogshipError};
use crate::event::FieldMap;

/// logship 통합 설정
///
/// `logship.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogshipConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 퍼블리셔 설정
    #[serde(default)]
    pub publisher: PublisherConfig,
    /// 텔레메트리 싱크 설정
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// 파서 설정
    #[serde(default)]
    pub parser: ParserConfig,
    /// 메트릭 엔드포인트 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl LogshipConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogshipError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드와 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogshipError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogshipError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogshipError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogshipError> {
        toml::from_str(toml_str).map_err(|e| {
            LogshipError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGSHIP_{SECTION}_{FIELD}`
    /// 예: `LOGSHIP_TELEMETRY_WRITE_KEY=abc123`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGSHIP_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGSHIP_GENERAL_LOG_FORMAT");

        // Publisher
        override_parsed(&mut self.publisher.output, "LOGSHIP_PUBLISHER_OUTPUT");
        override_parsed(&mut self.publisher.parser, "LOGSHIP_PUBLISHER_PARSER");
        override_parsed(&mut self.publisher.scrub_query, "LOGSHIP_PUBLISHER_SCRUB_QUERY");
        override_string(&mut self.publisher.scrub_field, "LOGSHIP_PUBLISHER_SCRUB_FIELD");
        override_parsed(
            &mut self.publisher.line_capacity,
            "LOGSHIP_PUBLISHER_LINE_CAPACITY",
        );
        override_parsed(
            &mut self.publisher.event_capacity,
            "LOGSHIP_PUBLISHER_EVENT_CAPACITY",
        );
        override_fields(
            &mut self.publisher.extra_fields,
            "LOGSHIP_PUBLISHER_EXTRA_FIELDS",
        );

        // Telemetry
        override_string(&mut self.telemetry.write_key, "LOGSHIP_TELEMETRY_WRITE_KEY");
        override_string(&mut self.telemetry.dataset, "LOGSHIP_TELEMETRY_DATASET");
        override_string(&mut self.telemetry.api_host, "LOGSHIP_TELEMETRY_API_HOST");
        override_parsed(&mut self.telemetry.sample_rate, "LOGSHIP_TELEMETRY_SAMPLE_RATE");
        override_parsed(&mut self.telemetry.batch_size, "LOGSHIP_TELEMETRY_BATCH_SIZE");
        override_parsed(
            &mut self.telemetry.batch_timeout_ms,
            "LOGSHIP_TELEMETRY_BATCH_TIMEOUT_MS",
        );
        override_parsed(
            &mut self.telemetry.pending_capacity,
            "LOGSHIP_TELEMETRY_PENDING_CAPACITY",
        );
        override_parsed(
            &mut self.telemetry.request_timeout_secs,
            "LOGSHIP_TELEMETRY_REQUEST_TIMEOUT_SECS",
        );

        // Parser
        override_string(
            &mut self.parser.timestamp_field,
            "LOGSHIP_PARSER_TIMESTAMP_FIELD",
        );
        override_parsed(&mut self.parser.max_line_bytes, "LOGSHIP_PARSER_MAX_LINE_BYTES");

        // Metrics
        override_parsed(&mut self.metrics.enabled, "LOGSHIP_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "LOGSHIP_METRICS_LISTEN_ADDR");
        override_parsed(&mut self.metrics.port, "LOGSHIP_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogshipError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        self.publisher.validate()?;
        self.parser.validate()?;

        // 텔레메트리 자격 증명은 해당 출력이 선택된 경우에만 필요
        if self.publisher.output == OutputKind::Honeycomb {
            self.telemetry.validate()?;
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must be greater than 0"));
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 출력 대상 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// 텔레메트리 백엔드 (Honeycomb 배치 API)
    #[default]
    Honeycomb,
    /// 원시 텍스트를 그대로 stdout에 출력
    Stdout,
    /// 파싱된 이벤트를 JSON 라인으로 stdout에 출력
    Json,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Honeycomb => write!(f, "honeycomb"),
            Self::Stdout => write!(f, "stdout"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "honeycomb" => Ok(Self::Honeycomb),
            "stdout" => Ok(Self::Stdout),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                field: "publisher.output".to_owned(),
                reason: format!("unknown output '{other}', expected honeycomb, stdout or json"),
            }),
        }
    }
}

/// 파서 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    /// 라인당 JSON 객체 하나
    #[default]
    Json,
    /// 라인 전체를 `message` 필드로 사용
    Plain,
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

impl FromStr for ParserKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "plain" => Ok(Self::Plain),
            other => Err(ConfigError::InvalidValue {
                field: "publisher.parser".to_owned(),
                reason: format!("unknown parser '{other}', expected json or plain"),
            }),
        }
    }
}

/// 퍼블리셔 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// 출력 대상
    pub output: OutputKind,
    /// 라인 파서
    pub parser: ParserKind,
    /// 민감 필드 해시 치환 여부
    pub scrub_query: bool,
    /// 스크러빙 대상 필드명
    pub scrub_field: String,
    /// 라인 입력 채널 용량 (가득 차면 write 호출이 대기)
    pub line_capacity: usize,
    /// 파서 출력 이벤트 채널 용량
    pub event_capacity: usize,
    /// 모든 이벤트에 기본값으로 병합되는 정적 필드
    pub extra_fields: FieldMap,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            output: OutputKind::Honeycomb,
            parser: ParserKind::Json,
            scrub_query: false,
            scrub_field: "query".to_owned(),
            line_capacity: 256,
            event_capacity: 256,
            extra_fields: FieldMap::new(),
        }
    }
}

impl PublisherConfig {
    const MAX_CHANNEL_CAPACITY: usize = 1_000_000;

    /// 퍼블리셔 설정을 검증합니다.
    pub fn validate(&self) -> Result<(), LogshipError> {
        if self.scrub_query && self.scrub_field.is_empty() {
            return Err(invalid(
                "publisher.scrub_field",
                "must not be empty when scrub_query is enabled",
            ));
        }

        for (field, value) in [
            ("publisher.line_capacity", self.line_capacity),
            ("publisher.event_capacity", self.event_capacity),
        ] {
            if value == 0 || value > Self::MAX_CHANNEL_CAPACITY {
                return Err(invalid(
                    field,
                    format!("must be 1-{}", Self::MAX_CHANNEL_CAPACITY),
                ));
            }
        }

        if self.extra_fields.keys().any(|k| k.is_empty()) {
            return Err(invalid(
                "publisher.extra_fields",
                "field names must not be empty",
            ));
        }

        Ok(())
    }
}

/// 텔레메트리 싱크 설정
///
/// `Debug` 출력에서는 write key가 가려집니다.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// API write key
    pub write_key: String,
    /// 대상 데이터셋
    pub dataset: String,
    /// API 호스트 주소
    pub api_host: String,
    /// 사전 샘플링 비율
    pub sample_rate: u32,
    /// 배치당 최대 이벤트 수
    pub batch_size: usize,
    /// 배치가 차지 않아도 전송하는 간격 (밀리초)
    pub batch_timeout_ms: u64,
    /// 전송 대기열 용량
    pub pending_capacity: usize,
    /// HTTP 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            write_key: String::new(),
            dataset: "rdslogs".to_owned(),
            api_host: "https://api.honeycomb.io/".to_owned(),
            sample_rate: 1,
            batch_size: 50,
            batch_timeout_ms: 100,
            pending_capacity: 10_000,
            request_timeout_secs: 10,
        }
    }
}

impl fmt::Debug for TelemetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("write_key", &"[REDACTED]")
            .field("dataset", &self.dataset)
            .field("api_host", &self.api_host)
            .field("sample_rate", &self.sample_rate)
            .field("batch_size", &self.batch_size)
            .field("batch_timeout_ms", &self.batch_timeout_ms)
            .field("pending_capacity", &self.pending_capacity)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl TelemetryConfig {
    const MAX_BATCH_SIZE: usize = 10_000;
    const MAX_BATCH_TIMEOUT_MS: u64 = 60_000;
    const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

    /// 텔레메트리 설정을 검증합니다.
    pub fn validate(&self) -> Result<(), LogshipError> {
        if self.write_key.is_empty() {
            return Err(invalid("telemetry.write_key", "must not be empty"));
        }
        if self.dataset.is_empty() {
            return Err(invalid("telemetry.dataset", "must not be empty"));
        }
        if !(self.api_host.starts_with("http://") || self.api_host.starts_with("https://")) {
            return Err(invalid(
                "telemetry.api_host",
                "must start with http:// or https://",
            ));
        }
        if self.sample_rate == 0 {
            return Err(invalid("telemetry.sample_rate", "must be at least 1"));
        }
        if self.batch_size == 0 || self.batch_size > Self::MAX_BATCH_SIZE {
            return Err(invalid(
                "telemetry.batch_size",
                format!("must be 1-{}", Self::MAX_BATCH_SIZE),
            ));
        }
        if self.batch_timeout_ms == 0 || self.batch_timeout_ms > Self::MAX_BATCH_TIMEOUT_MS {
            return Err(invalid(
                "telemetry.batch_timeout_ms",
                format!("must be 1-{}", Self::MAX_BATCH_TIMEOUT_MS),
            ));
        }
        if self.pending_capacity == 0 {
            return Err(invalid(
                "telemetry.pending_capacity",
                "must be greater than 0",
            ));
        }
        if self.request_timeout_secs == 0
            || self.request_timeout_secs > Self::MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(invalid(
                "telemetry.request_timeout_secs",
                format!("must be 1-{}", Self::MAX_REQUEST_TIMEOUT_SECS),
            ));
        }
        Ok(())
    }
}

/// 파서 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// JSON 파서가 이벤트 시각으로 사용할 필드명
    pub timestamp_field: String,
    /// 라인 최대 크기 (바이트)
    pub max_line_bytes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            timestamp_field: "timestamp".to_owned(),
            max_line_bytes: 1024 * 1024, // 1MB
        }
    }
}

impl ParserConfig {
    const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

    /// 파서 설정을 검증합니다.
    pub fn validate(&self) -> Result<(), LogshipError> {
        if self.timestamp_field.is_empty() {
            return Err(invalid("parser.timestamp_field", "must not be empty"));
        }
        if self.max_line_bytes == 0 || self.max_line_bytes > Self::MAX_LINE_BYTES {
            return Err(invalid(
                "parser.max_line_bytes",
                format!("must be 1-{}", Self::MAX_LINE_BYTES),
            ));
        }
        Ok(())
    }
}

/// 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> LogshipError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: FromStr>(target: &mut T, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse env var, ignoring"
            ),
        }
    }
}

/// `key=value,key2=value2` 형식의 환경변수를 extra fields에 병합합니다.
fn override_fields(target: &mut FieldMap, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        for pair in val.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    target.insert(
                        key.trim().to_owned(),
                        serde_json::Value::String(value.trim().to_owned()),
                    );
                }
                _ => warn!(env_key, pair, "expected key=value, ignoring"),
            }
        }
    }
}
