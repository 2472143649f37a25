//! 퍼블리셔 trait -- 호출자에게 노출되는 `write`/`close` 인터페이스
//!
//! # 구현체
//! - [`StreamingPublisher`](crate::stream::StreamingPublisher): 파서 + 싱크 클라이언트 파이프라인
//!   (텔레메트리, 구조화 콘솔)
//! - [`PlainConsolePublisher`](crate::console::PlainConsolePublisher): 원시 텍스트 직접 출력
//!
//! 설정에 따라 구현체를 고르는 경우 [`DynPublisher`]를 `Box<dyn DynPublisher>`로 사용합니다.
//! [`build_publisher`]가 `LogshipConfig`에서 이를 만들어 줍니다.

use std::future::Future;

use tracing::info;

use logship_core::config::{LogshipConfig, OutputKind, PublisherConfig};
use logship_core::pipeline::BoxFuture;

use crate::console::{self, ConsoleClientFactory, PlainConsolePublisher};
use crate::error::PublishError;
use crate::parser;
use crate::stream::StreamingPublisherBuilder;
use crate::telemetry;

/// 로그 청크를 대상에 기록하는 퍼블리셔
///
/// # 생명주기
/// - 첫 `write`에서 필요한 초기화를 수행합니다 (구현체에 따라 없음).
/// - `close`는 한 번만 호출해야 하며, 대기 중인 모든 레코드가 전송된 뒤 반환합니다.
/// - `close` 이후의 `write`/`close`는 프로그래밍 오류이며 [`PublishError::Closed`]를 반환합니다.
pub trait Publisher: Send {
    /// 퍼블리셔 이름
    fn name(&self) -> &str;

    /// 텍스트 청크를 기록합니다.
    ///
    /// 파서 입력이 가득 차 있으면 자리가 날 때까지 대기합니다.
    /// 이벤트 단위 전송 실패는 반환값에 나타나지 않습니다.
    fn write(&mut self, chunk: &str) -> impl Future<Output = Result<(), PublishError>> + Send;

    /// 입력을 닫고 대기 중인 레코드를 모두 플러시합니다.
    fn close(&mut self) -> impl Future<Output = Result<(), PublishError>> + Send;
}

/// dyn-compatible 퍼블리셔 trait
///
/// `Publisher` trait은 RPITIT를 사용하므로 `dyn Publisher`가 불가합니다.
/// `DynPublisher`는 `BoxFuture`를 반환하여 실행 시점에 구현체를 고를 수 있게 합니다.
pub trait DynPublisher: Send {
    /// 퍼블리셔 이름
    fn name(&self) -> &str;

    /// 텍스트 청크를 기록합니다.
    fn write<'a>(&'a mut self, chunk: &'a str) -> BoxFuture<'a, Result<(), PublishError>>;

    /// 입력을 닫고 대기 중인 레코드를 모두 플러시합니다.
    fn close(&mut self) -> BoxFuture<'_, Result<(), PublishError>>;
}

/// Publisher를 구현한 타입은 자동으로 DynPublisher도 구현됩니다.
impl<T: Publisher> DynPublisher for T {
    fn name(&self) -> &str {
        Publisher::name(self)
    }

    fn write<'a>(&'a mut self, chunk: &'a str) -> BoxFuture<'a, Result<(), PublishError>> {
        Box::pin(Publisher::write(self, chunk))
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), PublishError>> {
        Box::pin(Publisher::close(self))
    }
}

/// 설정의 `publisher.output`에 맞는 퍼블리셔를 생성합니다.
///
/// 싱크 연결은 첫 `write`까지 미뤄지므로, 자격 증명 오류는
/// 이 함수가 아니라 첫 `write`에서 [`PublishError::Init`]으로 드러납니다.
pub fn build_publisher(config: &LogshipConfig) -> Result<Box<dyn DynPublisher>, PublishError> {
    let settings = &config.publisher;

    info!(
        output = %settings.output,
        parser = %settings.parser,
        scrub_query = settings.scrub_query,
        extra_fields = settings.extra_fields.len(),
        "building publisher"
    );

    let builder = match settings.output {
        OutputKind::Stdout => return Ok(Box::new(PlainConsolePublisher::stdout())),
        OutputKind::Honeycomb => telemetry::publisher(
            config.telemetry.clone(),
            parser::from_config(settings.parser, &config.parser),
        ),
        OutputKind::Json => console::json_console(
            ConsoleClientFactory::stdout(),
            parser::from_config(settings.parser, &config.parser),
        ),
    };

    Ok(Box::new(configure(builder, settings).build()?))
}

/// 퍼블리셔 공통 설정을 빌더에 적용합니다.
fn configure(
    builder: StreamingPublisherBuilder,
    settings: &PublisherConfig,
) -> StreamingPublisherBuilder {
    let builder = builder
        .extra_fields(settings.extra_fields.clone())
        .line_capacity(settings.line_capacity)
        .event_capacity(settings.event_capacity);

    if settings.scrub_query {
        builder.scrub_field(settings.scrub_field.clone())
    } else {
        builder
    }
}
