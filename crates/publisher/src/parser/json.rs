//! JSON 라인 파서
//!
//! 라인 하나에 JSON 객체 하나가 담긴 로그를 파싱합니다.
//! 객체의 최상위 필드가 그대로 이벤트 필드가 됩니다.
//!
//! # 타임스탬프
//! 설정한 필드(기본: `timestamp`)에서 이벤트 시각을 읽습니다.
//! - RFC 3339 문자열: `2024-01-15T12:00:00Z`
//! - Unix timestamp (초, 소수 허용): `1705320000`, `1705320000.25`
//! - Unix timestamp (밀리초): `1705320000000`
//!
//! 필드가 없거나 해석할 수 없으면 수신 시각을 사용하고, 필드는 그대로 남깁니다.
//!
//! # 사용 예시
//! ```ignore
//! use logship_publisher::parser::JsonLineParser;
//!
//! let parser = JsonLineParser::new().with_timestamp_field("ts");
//! let event = parser.decode(r#"{"ts":"2024-01-15T12:00:00Z","query":"SELECT 1"}"#)?;
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;

use logship_core::error::ParseError;
use logship_core::event::Event;
use logship_core::pipeline::{BoxFuture, LineParser};

use super::decode_each;

/// 기본 최대 라인 크기 (1MB)
const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// 이 값보다 큰 정수 timestamp는 밀리초로 해석합니다.
const MILLIS_THRESHOLD: i64 = 9_999_999_999;

/// JSON 라인 파서
#[derive(Debug, Clone)]
pub struct JsonLineParser {
    /// 타임스탬프 필드명
    timestamp_field: String,
    /// 최대 허용 라인 크기 (바이트)
    max_line_bytes: usize,
}

impl JsonLineParser {
    /// 기본 설정으로 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            timestamp_field: "timestamp".to_owned(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// 타임스탬프 필드명을 설정합니다.
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = field.into();
        self
    }

    /// 최대 라인 크기를 설정합니다.
    pub fn with_max_line_bytes(mut self, max: usize) -> Self {
        self.max_line_bytes = max;
        self
    }

    /// 라인 하나를 이벤트로 디코딩합니다.
    ///
    /// 공백뿐인 라인은 이벤트를 만들지 않습니다 (`Ok(None)`).
    pub fn decode(&self, line: &str) -> Result<Option<Event>, ParseError> {
        if line.len() > self.max_line_bytes {
            return Err(ParseError::TooLarge {
                size: line.len(),
                max: self.max_line_bytes,
            });
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(trimmed).map_err(|e| ParseError::Failed {
            format: "json".to_owned(),
            offset: e.column().saturating_sub(1),
            reason: e.to_string(),
        })?;

        let Value::Object(data) = value else {
            return Err(ParseError::Failed {
                format: "json".to_owned(),
                offset: 0,
                reason: "expected JSON object".to_owned(),
            });
        };

        let timestamp = data
            .get(&self.timestamp_field)
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);

        Ok(Some(Event::new(timestamp, data)))
    }
}

impl Default for JsonLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser for JsonLineParser {
    fn format_name(&self) -> &str {
        "json"
    }

    fn process_lines(
        &self,
        lines: mpsc::Receiver<String>,
        events: mpsc::Sender<Event>,
    ) -> BoxFuture<'_, ()> {
        Box::pin(decode_each(self.format_name(), lines, events, move |line| {
            self.decode(line)
        }))
    }
}

/// 타임스탬프 값을 해석합니다.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            s.parse::<f64>().ok().and_then(from_unix)
        }
        Value::Number(n) => match n.as_i64() {
            Some(ts) if ts > MILLIS_THRESHOLD => DateTime::from_timestamp_millis(ts),
            Some(ts) => DateTime::from_timestamp(ts, 0),
            None => n.as_f64().and_then(from_unix),
        },
        _ => None,
    }
}

/// 소수 초 단위 Unix timestamp를 변환합니다.
fn from_unix(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    if secs > MILLIS_THRESHOLD as f64 {
        return DateTime::from_timestamp_millis(secs as i64);
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(line: &str) -> Event {
        JsonLineParser::new().decode(line).unwrap().unwrap()
    }

    #[test]
    fn format_name_is_json() {
        assert_eq!(JsonLineParser::new().format_name(), "json");
    }

    #[test]
    fn object_fields_become_event_data() {
        let event = decode(r#"{"query":"SELECT 1","duration_ms":3.5,"ok":true}"#);
        assert_eq!(event.data["query"], "SELECT 1");
        assert_eq!(event.data["duration_ms"], 3.5);
        assert_eq!(event.data["ok"], true);
    }

    #[test]
    fn rfc3339_timestamp_is_used() {
        let event = decode(r#"{"timestamp":"2024-01-15T12:00:00Z","a":1}"#);
        assert_eq!(event.timestamp.to_rfc3339(), "2024-01-15T12:00:00+00:00");
        // 필드는 데이터에도 남음
        assert!(event.data.contains_key("timestamp"));
    }

    #[test]
    fn unix_timestamps_are_used() {
        let secs = decode(r#"{"timestamp":1705320000}"#);
        assert_eq!(secs.timestamp.timestamp(), 1_705_320_000);

        let millis = decode(r#"{"timestamp":1705320000123}"#);
        assert_eq!(millis.timestamp.timestamp_millis(), 1_705_320_000_123);

        let fractional = decode(r#"{"timestamp":"1705320000.5"}"#);
        assert_eq!(fractional.timestamp.timestamp_millis(), 1_705_320_000_500);
    }

    #[test]
    fn custom_timestamp_field() {
        let parser = JsonLineParser::new().with_timestamp_field("ts");
        let event = parser
            .decode(r#"{"ts":"2020-06-01T00:00:00Z"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.timestamp.timestamp(), 1_590_969_600);
    }

    #[test]
    fn invalid_timestamp_falls_back_to_now() {
        let before = Utc::now();
        let event = decode(r#"{"timestamp":"yesterday"}"#);
        assert!(event.timestamp >= before);
        assert_eq!(event.data["timestamp"], "yesterday");
    }

    #[test]
    fn non_object_is_rejected() {
        let parser = JsonLineParser::new();
        assert!(parser.decode(r#"["not","an","object"]"#).is_err());
        assert!(parser.decode("42").is_err());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = JsonLineParser::new().decode("{not json").unwrap_err();
        assert!(matches!(err, ParseError::Failed { .. }));
    }

    #[test]
    fn oversize_line_is_rejected() {
        let parser = JsonLineParser::new().with_max_line_bytes(8);
        let err = parser.decode(r#"{"a":"0123456789"}"#).unwrap_err();
        assert!(matches!(err, ParseError::TooLarge { max: 8, .. }));
    }

    #[test]
    fn whitespace_line_yields_nothing() {
        assert!(JsonLineParser::new().decode("  \r").unwrap().is_none());
    }

    #[test]
    fn crlf_line_is_accepted() {
        let event = decode("{\"a\":1}\r");
        assert_eq!(event.data["a"], 1);
    }

    #[tokio::test]
    async fn bad_lines_are_skipped_in_stream() {
        let parser = JsonLineParser::new();
        let (line_tx, line_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::channel(8);

        for line in [r#"{"n":1}"#, "garbage", r#"{"n":2}"#] {
            line_tx.send(line.to_owned()).await.unwrap();
        }
        drop(line_tx);

        parser.process_lines(line_rx, event_tx).await;

        let mut seen = Vec::new();
        while let Some(event) = event_rx.recv().await {
            seen.push(event.data["n"].as_i64().unwrap());
        }
        assert_eq!(seen, vec![1, 2]);
    }
}
