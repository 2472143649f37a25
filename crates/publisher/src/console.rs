//! 콘솔 출력 -- 원시 텍스트 퍼블리셔와 JSON 라인 싱크 클라이언트
//!
//! - [`PlainConsolePublisher`]: 초기화나 태스크 없이 청크를 그대로 기록
//! - [`ConsoleClient`]: 레코드를 JSON 한 줄로 기록하는 싱크 클라이언트.
//!   [`StreamingPublisher`]와 조합되어 구조화 콘솔 퍼블리셔가 됩니다.
//!
//! 기본 출력은 stdout입니다. 운영 로그는 stderr로 가므로 섞이지 않습니다.
//! 쓰기는 모두 `tokio::io::AsyncWrite`를 거치므로 느린 파이프가 런타임
//! 워커를 붙잡지 않습니다.

use std::fmt;
use std::sync::Arc;

use chrono::SecondsFormat;
use serde_json::Value;
use tokio::io::{self, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, error};

use logship_core::error::SinkError;
use logship_core::event::SinkRecord;
use logship_core::pipeline::{BoxFuture, LineParser, SinkClient, SinkClientFactory};

use crate::error::PublishError;
use crate::publisher::Publisher;
use crate::stream::{StreamingPublisher, StreamingPublisherBuilder};

/// 구조화 콘솔 싱크 이름
pub const JSON_CONSOLE_SINK: &str = "json_stdout";

/// 원시 콘솔 퍼블리셔 이름
pub const PLAIN_CONSOLE_SINK: &str = "stdout";

/// 레코드에 추가되는 타임스탬프 필드
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// 싱크 클라이언트가 기록할 비동기 writer
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// 싱크 클라이언트가 사용할 writer를 만드는 함수
pub type MakeWriter = Arc<dyn Fn() -> BoxWriter + Send + Sync>;

fn stdout_writer() -> MakeWriter {
    Arc::new(|| -> BoxWriter { Box::new(io::stdout()) })
}

// ─── 원시 텍스트 ───────────────────────────────────────────────────

/// 청크를 가공 없이 기록하는 퍼블리셔
///
/// 파서도 싱크 클라이언트도 없으며, `write`는 청크를 다 기록한 뒤 반환합니다.
pub struct PlainConsolePublisher<W: AsyncWrite + Unpin + Send = io::Stdout> {
    writer: W,
    closed: bool,
}

impl PlainConsolePublisher {
    /// stdout에 기록하는 퍼블리셔를 생성합니다.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> PlainConsolePublisher<W> {
    /// 지정한 writer에 기록하는 퍼블리셔를 생성합니다.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            closed: false,
        }
    }

    /// writer를 돌려받습니다.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin + Send> Publisher for PlainConsolePublisher<W> {
    fn name(&self) -> &str {
        PLAIN_CONSOLE_SINK
    }

    async fn write(&mut self, chunk: &str) -> Result<(), PublishError> {
        if self.closed {
            error!(publisher = PLAIN_CONSOLE_SINK, "write called after close");
            return Err(PublishError::Closed(PLAIN_CONSOLE_SINK.to_owned()));
        }
        self.writer.write_all(chunk.as_bytes()).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        if self.closed {
            error!(publisher = PLAIN_CONSOLE_SINK, "close called more than once");
            return Err(PublishError::Closed(PLAIN_CONSOLE_SINK.to_owned()));
        }
        self.closed = true;
        self.writer.flush().await?;
        Ok(())
    }
}

// ─── JSON 라인 ─────────────────────────────────────────────────────

/// 레코드를 JSON 한 줄로 기록하는 싱크 클라이언트
///
/// 출력은 버퍼링되며 `close`에서 플러시됩니다.
pub struct ConsoleClient {
    writer: BufWriter<BoxWriter>,
    written: u64,
}

impl ConsoleClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(writer: BoxWriter) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    /// 레코드를 한 줄짜리 JSON으로 렌더링합니다.
    ///
    /// 병합된 필드에 RFC 3339 `timestamp` 필드를 덧씌웁니다.
    pub fn render(record: &SinkRecord) -> Result<Vec<u8>, SinkError> {
        let mut data = record.data.clone();
        data.insert(
            TIMESTAMP_FIELD.to_owned(),
            Value::String(
                record
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
        );
        let mut line = serde_json::to_vec(&data)?;
        line.push(b'\n');
        Ok(line)
    }
}

impl fmt::Debug for ConsoleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleClient")
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

impl SinkClient for ConsoleClient {
    fn name(&self) -> &str {
        JSON_CONSOLE_SINK
    }

    fn send<'a>(&'a mut self, record: &'a SinkRecord) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            let line = Self::render(record)?;
            self.writer.write_all(&line).await?;
            self.written += 1;
            Ok::<(), SinkError>(())
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), SinkError>> {
        Box::pin(async move {
            self.writer.flush().await?;
            debug!(written = self.written, "console sink flushed");
            Ok::<(), SinkError>(())
        })
    }
}

/// [`ConsoleClient`] 생성기
#[derive(Clone)]
pub struct ConsoleClientFactory {
    make_writer: MakeWriter,
}

impl ConsoleClientFactory {
    /// stdout에 기록하는 생성기
    pub fn stdout() -> Self {
        Self {
            make_writer: stdout_writer(),
        }
    }

    /// 지정한 writer 생성 함수를 사용하는 생성기
    pub fn with_writer(make_writer: MakeWriter) -> Self {
        Self { make_writer }
    }
}

impl Default for ConsoleClientFactory {
    fn default() -> Self {
        Self::stdout()
    }
}

impl SinkClientFactory for ConsoleClientFactory {
    fn name(&self) -> &str {
        JSON_CONSOLE_SINK
    }

    fn connect(&self) -> Result<Box<dyn SinkClient>, SinkError> {
        Ok(Box::new(ConsoleClient::new((self.make_writer)())))
    }
}

/// 구조화 콘솔 퍼블리셔 빌더를 생성합니다.
pub fn json_console(
    factory: ConsoleClientFactory,
    parser: Arc<dyn LineParser>,
) -> StreamingPublisherBuilder {
    StreamingPublisher::builder(Arc::new(factory), parser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::parser::PlainLineParser;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl AsyncWrite for SharedBuffer {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }

        fn factory(&self) -> ConsoleClientFactory {
            let buffer = self.clone();
            ConsoleClientFactory::with_writer(Arc::new(move || -> BoxWriter {
                Box::new(buffer.clone())
            }))
        }
    }

    fn record(data: Value) -> SinkRecord {
        let Value::Object(data) = data else {
            panic!("expected object");
        };
        SinkRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            data,
            sample_rate: 1,
        }
    }

    #[tokio::test]
    async fn plain_writes_raw_chunks() {
        let mut publisher = PlainConsolePublisher::new(Vec::new());
        publisher.write("a\n\nb").await.unwrap();
        publisher.write("\nc\n").await.unwrap();
        publisher.close().await.unwrap();

        assert_eq!(publisher.into_inner(), b"a\n\nb\nc\n");
    }

    #[tokio::test]
    async fn plain_rejects_use_after_close() {
        let mut publisher = PlainConsolePublisher::new(Vec::new());
        publisher.close().await.unwrap();

        assert!(matches!(
            publisher.write("x").await,
            Err(PublishError::Closed(_))
        ));
        assert!(matches!(
            publisher.close().await,
            Err(PublishError::Closed(_))
        ));
    }

    #[test]
    fn render_adds_timestamp() {
        let line = ConsoleClient::render(&record(json!({"q": "x"}))).unwrap();
        let text = String::from_utf8(line).unwrap();
        assert!(text.ends_with('\n'));

        let value: Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["q"], "x");
        assert_eq!(value["timestamp"], "2024-01-15T12:00:00Z");
    }

    #[test]
    fn render_overrides_parsed_timestamp_field() {
        let line = ConsoleClient::render(&record(json!({"timestamp": "raw"}))).unwrap();
        let value: Value = serde_json::from_slice(&line).unwrap();
        assert_eq!(value["timestamp"], "2024-01-15T12:00:00Z");
    }

    #[tokio::test]
    async fn client_writes_one_line_per_record() {
        let buffer = SharedBuffer::default();
        let mut client = buffer.factory().connect().unwrap();

        client.send(&record(json!({"n": 1}))).await.unwrap();
        client.send(&record(json!({"n": 2}))).await.unwrap();
        client.close().await.unwrap();

        let contents = buffer.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"n\":1"));
        assert!(lines[1].contains("\"n\":2"));
    }

    #[tokio::test]
    async fn client_output_is_flushed_on_close() {
        let buffer = SharedBuffer::default();
        let mut client = buffer.factory().connect().unwrap();

        client.send(&record(json!({"n": 1}))).await.unwrap();
        assert!(buffer.contents().is_empty());

        client.close().await.unwrap();
        assert_eq!(buffer.contents().lines().count(), 1);
    }

    #[tokio::test]
    async fn json_console_publisher_streams_lines() {
        let buffer = SharedBuffer::default();
        let mut publisher = json_console(buffer.factory(), Arc::new(PlainLineParser::new()))
            .build()
            .unwrap();

        assert_eq!(Publisher::name(&publisher), JSON_CONSOLE_SINK);

        publisher.write("hello\nworld\n").await.unwrap();
        publisher.close().await.unwrap();

        let contents = buffer.contents();
        let messages: Vec<String> = contents
            .lines()
            .map(|l| {
                let v: Value = serde_json::from_str(l).unwrap();
                v["message"].as_str().unwrap().to_owned()
            })
            .collect();
        assert_eq!(messages, vec!["hello", "world"]);
    }
}
