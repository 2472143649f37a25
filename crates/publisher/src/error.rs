//! 퍼블리셔 에러 타입
//!
//! [`PublishError`]는 `write`/`close` 호출자에게 전달되는 에러입니다.
//! 이벤트 단위 에러([`EnrichError`], 전송 실패)는 send 태스크 안에서
//! 로그로 남기고 삼키므로 호출자에게 전달되지 않습니다.
//!
//! `From<PublishError> for LogshipError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use logship_core::error::{LogshipError, PipelineError, SinkError};

/// 퍼블리셔 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// 싱크 클라이언트 초기화 실패 (첫 write 호출에서 발생)
    #[error("failed to initialize sink '{sink}': {source}")]
    Init {
        /// 싱크 이름
        sink: String,
        /// 원인
        #[source]
        source: SinkError,
    },

    /// 닫힌 퍼블리셔에 write/close 호출 (프로그래밍 오류)
    #[error("publisher '{0}' is closed")]
    Closed(String),

    /// 파서 입력 채널이 닫혀 라인을 넣을 수 없음
    #[error("line intake closed: parser task is no longer running")]
    ChannelClosed,

    /// 백그라운드 태스크가 패닉 등으로 비정상 종료
    #[error("{task} task failed: {reason}")]
    TaskFailed {
        /// 태스크 이름 (parser, send)
        task: &'static str,
        /// 실패 사유
        reason: String,
    },

    /// 종료 시 싱크 플러시 실패
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러 (콘솔 출력)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PublishError> for LogshipError {
    fn from(err: PublishError) -> Self {
        let msg = err.to_string();
        match err {
            PublishError::Init { source, .. } => LogshipError::Sink(source),
            PublishError::Sink(source) => LogshipError::Sink(source),
            PublishError::Io(e) => LogshipError::Io(e),
            PublishError::Closed(_) => LogshipError::Pipeline(PipelineError::Closed),
            PublishError::ChannelClosed => {
                LogshipError::Pipeline(PipelineError::ChannelSend(msg))
            }
            PublishError::TaskFailed { .. } => {
                LogshipError::Pipeline(PipelineError::TaskFailed(msg))
            }
            PublishError::Config { .. } => {
                LogshipError::Pipeline(PipelineError::InitFailed(msg))
            }
        }
    }
}

/// 필드 병합 에러
///
/// 해당 필드만 건너뛰고 이벤트 처리는 계속됩니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrichError {
    /// 빈 필드명
    #[error("{origin} field with empty name skipped")]
    EmptyFieldName {
        /// 필드 출처 (extra, parsed)
        origin: &'static str,
    },
}
