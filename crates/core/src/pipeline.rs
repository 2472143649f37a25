//! 파이프라인 trait — 파서 어댑터와 싱크 어댑터의 확장 포인트
//!
//! 퍼블리셔 코어는 이 trait들만 알고 있습니다. 실제 파싱 로직과
//! 전송 로직은 구현체가 제공합니다.
//!
//! ```text
//! write(chunk) -> mpsc<String> -> LineParser -> mpsc<Event> -> enrich -> SinkClient::send
//! ```

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::error::SinkError;
use crate::event::{Event, SinkRecord};

/// dyn-compatible trait에서 사용하는 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 파서 어댑터 trait
///
/// 라인 스트림을 소비해 이벤트 스트림을 생산합니다.
/// 입력 채널이 닫히면 남은 이벤트를 모두 내보낸 뒤 반환해야 하며,
/// 반환과 함께 `events` 송신측이 drop되어 출력 스트림이 닫힙니다.
///
/// 라인 하나가 이벤트를 만들지 않거나, 여러 라인이 이벤트 하나로
/// 합쳐질 수 있습니다. 다만 이벤트는 생성한 순서대로 보내야 합니다.
pub trait LineParser: Send + Sync {
    /// 파서 형식 이름 (json, plain 등)
    fn format_name(&self) -> &str;

    /// 입력 채널이 닫힐 때까지 라인을 파싱하여 이벤트를 전송합니다.
    fn process_lines(
        &self,
        lines: mpsc::Receiver<String>,
        events: mpsc::Sender<Event>,
    ) -> BoxFuture<'_, ()>;
}

/// 싱크 어댑터 trait
///
/// 레코드 하나를 받아 전송합니다 (내부적으로 배치될 수 있음).
/// 한 인스턴스는 한 퍼블리셔의 send 태스크가 독점합니다.
pub trait SinkClient: Send {
    /// 싱크 이름 (로그/메트릭 레이블용)
    fn name(&self) -> &str;

    /// 레코드 하나를 전송합니다.
    fn send<'a>(&'a mut self, record: &'a SinkRecord) -> BoxFuture<'a, Result<(), SinkError>>;

    /// 대기 중인 모든 레코드가 전송될 때까지 기다린 후 클라이언트를 닫습니다.
    fn close(&mut self) -> BoxFuture<'_, Result<(), SinkError>>;
}

/// 싱크 클라이언트 생성기
///
/// 퍼블리셔의 첫 `write` 호출에서 정확히 한 번 호출됩니다.
/// 자격 증명, 대상 주소, 샘플링 비율 등 싱크 수준 설정은 구현체가 보관합니다.
pub trait SinkClientFactory: Send + Sync {
    /// 싱크 이름
    fn name(&self) -> &str;

    /// 싱크 클라이언트를 생성합니다.
    ///
    /// 실패는 호출자에게 그대로 전파되는 치명적 초기화 에러입니다.
    fn connect(&self) -> Result<Box<dyn SinkClient>, SinkError>;
}
