//! 퍼블리셔 생명주기 상태
//!
//! ```text
//! Uninitialized --first write--> Initialized --close--> Closed
//!        \___________________________close_____________/
//! ```
//!
//! `Uninitialized -> Initialized` 전이는 정확히 한 번 일어나며 되돌릴 수 없습니다.
//! `Closed`에서는 어떤 전이도 없습니다.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use logship_core::pipeline::SinkClient;

/// 초기화 후 살아 있는 파이프라인 자원
pub(crate) struct Running {
    /// 파서 입력 채널 송신측. drop하면 파서가 남은 라인을 처리하고 종료합니다.
    pub(crate) lines: mpsc::Sender<String>,
    /// 파서 태스크
    pub(crate) parser_task: JoinHandle<()>,
    /// send 태스크. 종료 시 싱크 클라이언트를 돌려줍니다.
    pub(crate) send_task: JoinHandle<Box<dyn SinkClient>>,
}

/// 스트리밍 퍼블리셔 상태
pub(crate) enum SinkState {
    /// 아직 write가 호출되지 않음
    Uninitialized,
    /// 싱크 클라이언트와 두 태스크가 실행 중
    Initialized(Running),
    /// close 호출됨
    Closed,
}

impl SinkState {
    /// 상태 이름
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized(_) => "initialized",
            Self::Closed => "closed",
        }
    }

    /// 상태를 `Closed`로 바꾸고 이전 상태를 반환합니다.
    pub(crate) fn close(&mut self) -> SinkState {
        std::mem::replace(self, SinkState::Closed)
    }
}
