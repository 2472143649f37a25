//! 라인 파서 어댑터 -- 라인 스트림을 이벤트 스트림으로 변환
//!
//! 각 파서는 core의 [`LineParser`](logship_core::pipeline::LineParser) trait을 구현합니다.
//!
//! # 지원 형식
//! - 라인당 JSON 객체 하나 ([`JsonLineParser`])
//! - 평문 라인 ([`PlainLineParser`])
//!
//! # 사용 예시
//! ```ignore
//! use logship_core::config::{ParserConfig, ParserKind};
//! use logship_publisher::parser;
//!
//! let parser = parser::from_config(ParserKind::Json, &ParserConfig::default());
//! assert_eq!(parser.format_name(), "json");
//! ```

pub mod json;
pub mod plain;

pub use json::JsonLineParser;
pub use plain::PlainLineParser;

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use logship_core::config::{ParserConfig, ParserKind};
use logship_core::error::ParseError;
use logship_core::event::Event;
use logship_core::metrics as m;
use logship_core::pipeline::LineParser;

/// 설정에 맞는 파서를 생성합니다.
pub fn from_config(kind: ParserKind, config: &ParserConfig) -> Arc<dyn LineParser> {
    match kind {
        ParserKind::Json => Arc::new(
            JsonLineParser::new()
                .with_timestamp_field(config.timestamp_field.clone())
                .with_max_line_bytes(config.max_line_bytes),
        ),
        ParserKind::Plain => Arc::new(PlainLineParser::new()),
    }
}

/// 라인 단위 디코딩 루프
///
/// 라인 하나가 이벤트 0개 또는 1개가 되는 파서가 공유합니다.
/// 디코딩에 실패한 라인은 경고 로그와 메트릭을 남기고 건너뜁니다.
/// 이벤트 수신측이 사라지면 남은 라인을 버리고 종료합니다.
pub(crate) async fn decode_each<F>(
    format: &str,
    mut lines: mpsc::Receiver<String>,
    events: mpsc::Sender<Event>,
    mut decode: F,
) where
    F: FnMut(&str) -> Result<Option<Event>, ParseError>,
{
    let mut emitted = 0u64;
    let mut rejected = 0u64;

    while let Some(line) = lines.recv().await {
        match decode(&line) {
            Ok(Some(event)) => {
                if events.send(event).await.is_err() {
                    warn!(format, "event receiver dropped, stopping parser");
                    break;
                }
                emitted += 1;
            }
            Ok(None) => {}
            Err(e) => {
                rejected += 1;
                warn!(format, error = %e, line_len = line.len(), "skipping unparseable line");
                counter!(m::PARSER_LINES_REJECTED_TOTAL, m::LABEL_PARSER_FORMAT => format.to_owned())
                    .increment(1);
            }
        }
    }

    debug!(format, emitted, rejected, "line stream closed, parser finished");
}
