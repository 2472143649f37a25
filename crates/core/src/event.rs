//! 이벤트 타입 — 파서가 만들고 싱크가 소비하는 구조화 레코드
//!
//! # 흐름
//! ```text
//! Line(String) -> LineParser -> Event -> Enricher -> SinkRecord -> SinkClient
//! ```

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 필드 이름 -> 값 매핑
///
/// 값은 JSON 스칼라 또는 문자열입니다. 키 순서가 고정되어
/// 직렬화 결과가 결정적입니다.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// 파싱된 로그 이벤트
///
/// 하나 이상의 라인에서 파생됩니다. 파서에 따라 라인 하나가
/// 이벤트를 만들지 않을 수도 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// 원본 라인이 기록된 시각
    pub timestamp: DateTime<Utc>,
    /// 파싱된 필드
    pub data: FieldMap,
}

impl Event {
    /// 새 이벤트를 생성합니다.
    pub fn new(timestamp: DateTime<Utc>, data: FieldMap) -> Self {
        Self { timestamp, data }
    }

    /// 현재 시각으로 이벤트를 생성합니다.
    pub fn now(data: FieldMap) -> Self {
        Self::new(Utc::now(), data)
    }

    /// 필드 하나를 추가한 이벤트를 반환합니다.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} fields",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.data.len()
        )
    }
}

/// 싱크로 전달되는 레코드
///
/// 보강(enrichment)과 스크러빙이 끝난 최종 형태입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkRecord {
    /// 이벤트 시각
    pub timestamp: DateTime<Utc>,
    /// 병합된 필드 (extra fields + 파싱된 필드)
    pub data: FieldMap,
    /// 사전 샘플링 비율 (1 = 샘플링 없음). 싱크는 레코드를 버리지 않고 비율만 기록합니다.
    pub sample_rate: u32,
}

impl SinkRecord {
    /// 필드가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn with_field_inserts_value() {
        let ev = Event::now(FieldMap::new())
            .with_field("query", "SELECT 1")
            .with_field("duration_ms", 12);
        assert_eq!(ev.data["query"], "SELECT 1");
        assert_eq!(ev.data["duration_ms"], 12);
    }

    #[test]
    fn display_shows_timestamp_and_field_count() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let ev = Event::new(ts, FieldMap::new()).with_field("a", 1);
        assert_eq!(ev.to_string(), "[2024-01-15T12:00:00.000Z] 1 fields");
    }

    #[test]
    fn empty_record_detected() {
        let rec = SinkRecord {
            timestamp: Utc::now(),
            data: FieldMap::new(),
            sample_rate: 1,
        };
        assert!(rec.is_empty());
    }
}
