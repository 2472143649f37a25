//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logship_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logship_core::metrics::PUBLISHER_LINES_RECEIVED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 싱크 이름 레이블 키 (honeycomb, json_stdout)
pub const LABEL_SINK: &str = "sink";

/// 파서 형식 레이블 키 (json, plain)
pub const LABEL_PARSER_FORMAT: &str = "format";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Publisher 메트릭 ──────────────────────────────────────────────

/// Publisher: 파서에 투입된 라인 수 (counter)
pub const PUBLISHER_LINES_RECEIVED_TOTAL: &str = "logship_publisher_lines_received_total";

/// Publisher: 파서가 생성한 이벤트 수 (counter)
pub const PUBLISHER_EVENTS_PARSED_TOTAL: &str = "logship_publisher_events_parsed_total";

/// Publisher: 싱크에 전달된 이벤트 수 (counter)
pub const PUBLISHER_EVENTS_SENT_TOTAL: &str = "logship_publisher_events_sent_total";

/// Publisher: 전송 실패로 버려진 이벤트 수 (counter)
pub const PUBLISHER_EVENTS_DROPPED_TOTAL: &str = "logship_publisher_events_dropped_total";

/// Publisher: 사전 샘플링으로 버려진 이벤트 수 (counter)
pub const PUBLISHER_EVENTS_SAMPLED_OUT_TOTAL: &str = "logship_publisher_events_sampled_out_total";

/// Publisher: 병합 중 건너뛴 필드 수 (counter)
pub const PUBLISHER_FIELD_ERRORS_TOTAL: &str = "logship_publisher_field_errors_total";

/// Publisher: 스크러빙된 필드 수 (counter)
pub const PUBLISHER_FIELDS_SCRUBBED_TOTAL: &str = "logship_publisher_fields_scrubbed_total";

/// Parser: 파싱 실패로 버려진 라인 수 (counter, label: format)
pub const PARSER_LINES_REJECTED_TOTAL: &str = "logship_parser_lines_rejected_total";

// ─── Transmission 메트릭 ───────────────────────────────────────────

/// Transmission: 전송한 배치 수 (counter, label: result)
pub const TRANSMISSION_BATCHES_TOTAL: &str = "logship_transmission_batches_total";

/// Transmission: 원격에서 거부된 이벤트 수 (counter)
pub const TRANSMISSION_EVENTS_REJECTED_TOTAL: &str = "logship_transmission_events_rejected_total";

/// Transmission: 배치 전송 소요 시간 (histogram, 초)
pub const TRANSMISSION_BATCH_DURATION_SECONDS: &str = "logship_transmission_batch_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        PUBLISHER_LINES_RECEIVED_TOTAL,
        "Total number of non-empty lines handed to the parser"
    );
    describe_counter!(
        PUBLISHER_EVENTS_PARSED_TOTAL,
        "Total number of events emitted by the parser"
    );
    describe_counter!(
        PUBLISHER_EVENTS_SENT_TOTAL,
        "Total number of events accepted by the sink client"
    );
    describe_counter!(
        PUBLISHER_EVENTS_DROPPED_TOTAL,
        "Total number of events dropped because the sink rejected them"
    );
    describe_counter!(
        PUBLISHER_EVENTS_SAMPLED_OUT_TOTAL,
        "Total number of events discarded by presampling before enrichment"
    );
    describe_counter!(
        PUBLISHER_FIELD_ERRORS_TOTAL,
        "Total number of fields skipped while merging extra fields"
    );
    describe_counter!(
        PUBLISHER_FIELDS_SCRUBBED_TOTAL,
        "Total number of sensitive field values replaced by their digest"
    );
    describe_counter!(
        PARSER_LINES_REJECTED_TOTAL,
        "Total number of lines the parser could not turn into an event"
    );
    describe_counter!(
        TRANSMISSION_BATCHES_TOTAL,
        "Total number of batches posted to the telemetry API"
    );
    describe_counter!(
        TRANSMISSION_EVENTS_REJECTED_TOTAL,
        "Total number of events rejected by the telemetry API"
    );
    describe_histogram!(
        TRANSMISSION_BATCH_DURATION_SECONDS,
        "Time to post a single batch in seconds"
    );
}
