//! 보강/스크러빙 단계 -- 이벤트를 싱크 레코드로 변환합니다.
//!
//! send 태스크 안에서 이벤트마다 동기적으로 실행됩니다.
//!
//! 1. 스크러빙이 켜져 있고 민감 필드가 있으면 값의 SHA-256 hex 다이제스트로 치환
//! 2. extra fields를 병합 (파싱된 필드가 우선, extra는 빈 자리만 채움)
//! 3. 타임스탬프 + 병합된 필드 + 샘플링 비율로 [`SinkRecord`] 생성
//!
//! 이 모듈은 로그를 남기지 않습니다. 병합 에러는 [`Enriched::errors`]로
//! 돌려주고, 호출자(send 태스크)가 이벤트 컨텍스트와 함께 기록합니다.

use serde_json::Value;
use sha2::{Digest, Sha256};

use logship_core::event::{Event, FieldMap, SinkRecord};

use crate::error::EnrichError;

/// 민감 필드 값을 되돌릴 수 없는 다이제스트로 변환합니다.
///
/// 문자열은 원문 그대로, 그 외 값은 JSON 표현을 해시합니다.
/// 같은 입력은 항상 같은 64자 소문자 hex 문자열이 됩니다.
pub fn scrub_value(value: &Value) -> String {
    let digest = match value {
        Value::String(s) => Sha256::digest(s.as_bytes()),
        other => Sha256::digest(other.to_string().as_bytes()),
    };
    hex::encode(digest)
}

/// 보강 결과
#[derive(Debug)]
pub struct Enriched {
    /// 싱크로 보낼 레코드
    pub record: SinkRecord,
    /// 건너뛴 필드 목록
    pub errors: Vec<EnrichError>,
    /// 민감 필드를 치환했는지 여부
    pub scrubbed: bool,
}

/// 이벤트 보강기
///
/// 퍼블리셔 생성 시 한 번 구성되며, 이후 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct Enricher {
    /// 스크러빙 대상 필드 (None이면 스크러빙 비활성화)
    scrub_field: Option<String>,
    /// 정적 extra fields
    extra_fields: FieldMap,
    /// 레코드에 기록할 사전 샘플링 비율
    sample_rate: u32,
}

impl Enricher {
    /// extra fields만 병합하는 보강기를 생성합니다.
    pub fn new(extra_fields: FieldMap) -> Self {
        Self {
            scrub_field: None,
            extra_fields,
            sample_rate: 1,
        }
    }

    /// 지정한 필드를 스크러빙하도록 설정합니다.
    pub fn with_scrub_field(mut self, field: impl Into<String>) -> Self {
        self.scrub_field = Some(field.into());
        self
    }

    /// 샘플링 비율을 설정합니다. 0은 1로 취급합니다.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate.max(1);
        self
    }

    /// extra fields를 교체합니다.
    pub fn with_extra_fields(mut self, extra_fields: FieldMap) -> Self {
        self.extra_fields = extra_fields;
        self
    }

    /// 샘플링 비율을 반환합니다.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// 스크러빙 대상 필드를 반환합니다.
    pub fn scrub_field(&self) -> Option<&str> {
        self.scrub_field.as_deref()
    }

    /// extra fields를 반환합니다.
    pub fn extra_fields(&self) -> &FieldMap {
        &self.extra_fields
    }

    /// 이벤트를 스크러빙/병합하여 싱크 레코드로 변환합니다.
    pub fn enrich(&self, event: Event) -> Enriched {
        let Event {
            timestamp,
            mut data,
        } = event;

        let mut scrubbed = false;
        if let Some(field) = &self.scrub_field {
            if let Some(value) = data.get_mut(field) {
                *value = Value::String(scrub_value(value));
                scrubbed = true;
            }
        }

        let errors = self.merge_extra(&mut data);

        Enriched {
            record: SinkRecord {
                timestamp,
                data,
                sample_rate: self.sample_rate,
            },
            errors,
            scrubbed,
        }
    }

    /// extra fields를 빈 자리에만 채우고, 이름 없는 필드를 걸러냅니다.
    fn merge_extra(&self, data: &mut FieldMap) -> Vec<EnrichError> {
        let mut errors = Vec::new();

        if data.remove("").is_some() {
            errors.push(EnrichError::EmptyFieldName { origin: "parsed" });
        }

        for (key, value) in &self.extra_fields {
            if key.is_empty() {
                errors.push(EnrichError::EmptyFieldName { origin: "extra" });
                continue;
            }
            data.entry(key.clone()).or_insert_with(|| value.clone());
        }

        errors
    }
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new(FieldMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn scrub_is_deterministic() {
        let a = scrub_value(&json!("SELECT * FROM users WHERE id = 1"));
        let b = scrub_value(&json!("SELECT * FROM users WHERE id = 1"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn scrub_matches_known_sha256() {
        // sha256("abc")
        assert_eq!(
            scrub_value(&json!("abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn scrub_differs_from_input() {
        for input in ["x", "SELECT 1", "ba7816bf"] {
            assert_ne!(scrub_value(&json!(input)), input);
        }
    }

    #[test]
    fn scrub_hashes_non_string_by_json_text() {
        assert_eq!(scrub_value(&json!(42)), scrub_value(&json!("42")));
    }

    #[test]
    fn parsed_fields_win_over_extra_fields() {
        let enricher = Enricher::new(fields(json!({"env": "prod"})));
        let event = Event::now(fields(json!({"env": "staging", "q": "x"})));

        let out = enricher.enrich(event);

        assert_eq!(out.record.data["env"], "staging");
        assert_eq!(out.record.data["q"], "x");
        assert!(out.errors.is_empty());
    }

    #[test]
    fn extra_fields_fill_gaps() {
        let enricher = Enricher::new(fields(json!({"env": "prod", "region": "eu"})));
        let event = Event::now(fields(json!({"q": "x"})));

        let out = enricher.enrich(event);

        assert_eq!(out.record.data["env"], "prod");
        assert_eq!(out.record.data["region"], "eu");
        assert_eq!(out.record.data.len(), 3);
    }

    #[test]
    fn scrubbing_replaces_query_only_when_enabled() {
        let event = Event::now(fields(json!({"query": "SELECT 1", "user": "app"})));

        let plain = Enricher::default().enrich(event.clone());
        assert_eq!(plain.record.data["query"], "SELECT 1");
        assert!(!plain.scrubbed);

        let scrubbed = Enricher::default().with_scrub_field("query").enrich(event);
        assert_eq!(scrubbed.record.data["query"], scrub_value(&json!("SELECT 1")));
        assert_eq!(scrubbed.record.data["user"], "app");
        assert!(scrubbed.scrubbed);
    }

    #[test]
    fn scrubbing_without_field_is_noop() {
        let event = Event::now(fields(json!({"user": "app"})));
        let out = Enricher::default().with_scrub_field("query").enrich(event);
        assert!(!out.scrubbed);
        assert!(!out.record.data.contains_key("query"));
    }

    #[test]
    fn extra_query_field_is_not_scrubbed() {
        // 스크러빙은 병합 전에 일어나므로 extra fields의 값은 그대로 남음
        let enricher =
            Enricher::new(fields(json!({"query": "static"}))).with_scrub_field("query");
        let out = enricher.enrich(Event::now(fields(json!({"a": 1}))));
        assert_eq!(out.record.data["query"], "static");
    }

    #[test]
    fn empty_field_names_are_skipped_and_reported() {
        let enricher = Enricher::new(fields(json!({"": "bad", "env": "prod"})));
        let event = Event::now(fields(json!({"": "also bad", "q": "x"})));

        let out = enricher.enrich(event);

        assert!(!out.record.data.contains_key(""));
        assert_eq!(out.record.data["env"], "prod");
        assert_eq!(
            out.errors,
            vec![
                EnrichError::EmptyFieldName { origin: "parsed" },
                EnrichError::EmptyFieldName { origin: "extra" },
            ]
        );
    }

    #[test]
    fn record_keeps_timestamp_and_sample_rate() {
        let event = Event::now(fields(json!({"a": 1})));
        let ts = event.timestamp;
        let out = Enricher::default().with_sample_rate(10).enrich(event);
        assert_eq!(out.record.timestamp, ts);
        assert_eq!(out.record.sample_rate, 10);
    }

    #[test]
    fn zero_sample_rate_is_clamped() {
        let out = Enricher::default()
            .with_sample_rate(0)
            .enrich(Event::now(fields(json!({"a": 1}))));
        assert_eq!(out.record.sample_rate, 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn digest_never_equals_input(input in ".{1,256}") {
                let digest = scrub_value(&Value::String(input.clone()));
                prop_assert_ne!(&digest, &input);
                prop_assert_eq!(digest.len(), 64);
            }

            #[test]
            fn digest_is_deterministic(input in ".*") {
                let value = Value::String(input);
                prop_assert_eq!(scrub_value(&value), scrub_value(&value));
            }
        }
    }
}
