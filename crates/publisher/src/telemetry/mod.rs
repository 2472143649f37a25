//! 텔레메트리 싱크 -- 이벤트를 배치 HTTP API로 전송
//!
//! # 구성
//! - [`HttpClientFactory`]: 설정을 검증하고 HTTP 클라이언트 + 전송 태스크를 만듦
//! - [`HttpEventClient`]: 퍼블리셔 send 태스크가 사용하는 싱크 클라이언트
//! - `transmission`: 배치 수집과 POST를 담당하는 백그라운드 태스크
//!
//! # 와이어 형식
//! ```text
//! POST {api_host}/1/batch/{dataset}
//! X-Honeycomb-Team: {write_key}
//!
//! [{"time":"2024-01-15T12:00:00Z","samplerate":1,"data":{...}}, ...]
//! ```

mod client;
mod transmission;

pub use client::HttpEventClient;
pub use transmission::{TransmissionStats, WRITE_KEY_HEADER};

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::sync::mpsc;
use tracing::debug;

use logship_core::config::TelemetryConfig;
use logship_core::error::SinkError;
use logship_core::pipeline::{LineParser, SinkClient, SinkClientFactory};

use crate::stream::{StreamingPublisher, StreamingPublisherBuilder};
use transmission::Transmission;

/// 텔레메트리 싱크 이름
pub const TELEMETRY_SINK: &str = "honeycomb";

/// [`HttpEventClient`] 생성기
///
/// 자격 증명과 전송 설정을 보관하며, `connect`에서 한 번 검증합니다.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    config: TelemetryConfig,
}

impl HttpClientFactory {
    /// 새 생성기를 만듭니다.
    pub fn new(config: TelemetryConfig) -> Self {
        Self { config }
    }

    /// 보관 중인 설정을 반환합니다.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

impl SinkClientFactory for HttpClientFactory {
    fn name(&self) -> &str {
        TELEMETRY_SINK
    }

    fn connect(&self) -> Result<Box<dyn SinkClient>, SinkError> {
        let config = &self.config;
        validate(config)?;
        let url = batch_url(&config.api_host, &config.dataset)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("logship/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SinkError::Transport(format!("failed to build http client: {e}")))?;

        debug!(url = %url, dataset = %config.dataset, "telemetry sink connected");

        let (queue, rx) = mpsc::channel(config.pending_capacity);
        let transmission = Transmission {
            http,
            url,
            write_key: config.write_key.clone(),
            batch_size: config.batch_size,
            batch_timeout: Duration::from_millis(config.batch_timeout_ms),
            rx,
        };

        Ok(Box::new(HttpEventClient::start(queue, transmission)))
    }
}

/// 텔레메트리 퍼블리셔 빌더를 생성합니다.
///
/// 설정의 `sample_rate`가 N이면 이벤트 N개 중 1개만 보내고 레코드에 N을 기록합니다.
pub fn publisher(config: TelemetryConfig, parser: Arc<dyn LineParser>) -> StreamingPublisherBuilder {
    let sample_rate = config.sample_rate;
    StreamingPublisher::builder(Arc::new(HttpClientFactory::new(config)), parser)
        .sample_rate(sample_rate)
}

/// 연결에 필요한 설정을 검증합니다.
fn validate(config: &TelemetryConfig) -> Result<(), SinkError> {
    let invalid = |field: &str, reason: &str| SinkError::InvalidConfig {
        field: field.to_owned(),
        reason: reason.to_owned(),
    };

    if config.write_key.is_empty() {
        return Err(invalid("write_key", "must not be empty"));
    }
    if config.dataset.is_empty() {
        return Err(invalid("dataset", "must not be empty"));
    }
    if config.sample_rate == 0 {
        return Err(invalid("sample_rate", "must be at least 1"));
    }
    if config.batch_size == 0 {
        return Err(invalid("batch_size", "must be greater than 0"));
    }
    if config.batch_timeout_ms == 0 {
        return Err(invalid("batch_timeout_ms", "must be greater than 0"));
    }
    if config.pending_capacity == 0 {
        return Err(invalid("pending_capacity", "must be greater than 0"));
    }
    Ok(())
}

/// `{api_host}/1/batch/{dataset}` URL을 만듭니다.
fn batch_url(api_host: &str, dataset: &str) -> Result<Url, SinkError> {
    let invalid = |reason: String| SinkError::InvalidConfig {
        field: "api_host".to_owned(),
        reason,
    };

    let mut url = Url::parse(api_host).map_err(|e| invalid(format!("'{api_host}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    url.path_segments_mut()
        .map_err(|()| invalid(format!("'{api_host}' cannot be a base URL")))?
        .pop_if_empty()
        .extend(["1", "batch", dataset]);
    url.set_query(None);
    Ok(url)
}
