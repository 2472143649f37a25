//! 에러 타입 — 도메인별 에러 정의

/// logship 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogshipError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 싱크 전송 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 백그라운드 태스크 비정상 종료
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 닫힌 퍼블리셔 사용
    #[error("publisher already closed")]
    Closed,
}

/// 파싱 에러
///
/// 라인 단위로 로그에 남고 버려지며, 파서 밖으로 전파되지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 파싱 실패
    #[error("{format} parse failed at offset {offset}: {reason}")]
    Failed {
        format: String,
        offset: usize,
        reason: String,
    },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },
}

/// 싱크 어댑터 에러
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 싱크 클라이언트 설정 오류 (초기화 시점)
    #[error("invalid sink config '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    /// 필드가 하나도 없는 레코드
    #[error("refusing to send empty event")]
    EmptyEvent,

    /// 전송 큐가 닫힘 (클라이언트 종료 후 send 호출 등)
    #[error("sink transmission closed")]
    TransmissionClosed,

    /// 직렬화 실패
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 네트워크/전송 실패
    #[error("transport failed: {0}")]
    Transport(String),

    /// I/O 에러 (콘솔 싱크 등)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
