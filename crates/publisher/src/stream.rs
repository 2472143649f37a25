//! 스트리밍 퍼블리셔 -- 라인 투입, 지연 초기화, 파서/send 태스크 배선
//!
//! # 내부 아키텍처
//! ```text
//! write(chunk) -> split_lines -> mpsc<String> -> [parser task] -> mpsc<Event> -> [send task] -> SinkClient
//!                                                 LineParser                  Sampler + Enricher
//! ```
//!
//! 첫 `write` 호출에서 싱크 클라이언트를 만들고 두 태스크를 스폰합니다.
//! `close`는 라인 채널을 닫아 파서 -> send 태스크 순으로 드레인을 전파하고,
//! send 태스크가 돌려준 클라이언트의 `close`(플러시 배리어)까지 기다립니다.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use logship_core::event::{Event, FieldMap};
use logship_core::metrics as m;
use logship_core::pipeline::{LineParser, SinkClient, SinkClientFactory};

use crate::chunk::split_lines;
use crate::enrich::{Enriched, Enricher};
use crate::error::PublishError;
use crate::lifecycle::{Running, SinkState};
use crate::publisher::Publisher;
use crate::sample::Sampler;

/// 기본 채널 용량
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// 파서와 싱크 클라이언트를 잇는 스트리밍 퍼블리셔
///
/// 텔레메트리 싱크와 구조화 콘솔 싱크가 이 타입을 공유하며,
/// 차이는 [`SinkClientFactory`] 구현뿐입니다.
///
/// # 사용 예시
/// ```ignore
/// use logship_publisher::{Publisher, StreamingPublisher};
///
/// let mut publisher = StreamingPublisher::builder(factory, parser)
///     .scrub_field("query")
///     .extra_fields(extra)
///     .build()?;
///
/// publisher.write("line one\nline two\n").await?;
/// publisher.close().await?;
/// ```
pub struct StreamingPublisher {
    /// 퍼블리셔 이름 (로그/메트릭용)
    name: String,
    /// 파서 어댑터
    parser: Arc<dyn LineParser>,
    /// 싱크 클라이언트 생성기
    factory: Arc<dyn SinkClientFactory>,
    /// 보강기
    enricher: Arc<Enricher>,
    /// 샘플러 시드 (None이면 스레드 RNG로 시드)
    sample_seed: Option<u64>,
    /// 라인 채널 용량
    line_capacity: usize,
    /// 이벤트 채널 용량
    event_capacity: usize,
    /// 생명주기 상태
    state: SinkState,
}

impl StreamingPublisher {
    /// 빌더를 생성합니다.
    pub fn builder(
        factory: Arc<dyn SinkClientFactory>,
        parser: Arc<dyn LineParser>,
    ) -> StreamingPublisherBuilder {
        StreamingPublisherBuilder::new(factory, parser)
    }

    /// 현재 상태 이름을 반환합니다 (uninitialized, initialized, closed).
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// 초기화 여부를 반환합니다.
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, SinkState::Initialized(_))
    }

    /// 보강기 설정을 반환합니다.
    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// 싱크 클라이언트를 만들고 두 태스크를 스폰합니다.
    fn start(&self) -> Result<Running, PublishError> {
        info!(
            publisher = %self.name,
            sink = self.factory.name(),
            parser = self.parser.format_name(),
            "initializing publisher"
        );

        let client = self.factory.connect().map_err(|source| PublishError::Init {
            sink: self.factory.name().to_owned(),
            source,
        })?;

        let (line_tx, line_rx) = mpsc::channel(self.line_capacity);
        let (event_tx, event_rx) = mpsc::channel(self.event_capacity);

        let parser = Arc::clone(&self.parser);
        let parser_task = tokio::spawn(async move {
            parser.process_lines(line_rx, event_tx).await;
        });

        let rate = self.enricher.sample_rate();
        let sampler = match self.sample_seed {
            Some(seed) => Sampler::with_seed(rate, seed),
            None => Sampler::new(rate),
        };

        let send_task = tokio::spawn(run_send_loop(
            event_rx,
            Arc::clone(&self.enricher),
            sampler,
            client,
            self.name.clone(),
        ));

        Ok(Running {
            lines: line_tx,
            parser_task,
            send_task,
        })
    }
}

impl Publisher for StreamingPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, chunk: &str) -> Result<(), PublishError> {
        match self.state {
            SinkState::Uninitialized => {
                let running = self.start()?;
                self.state = SinkState::Initialized(running);
            }
            SinkState::Initialized(_) => {}
            SinkState::Closed => {
                error!(publisher = %self.name, "write called after close");
                return Err(PublishError::Closed(self.name.clone()));
            }
        }

        let lines = match &self.state {
            SinkState::Initialized(running) => running.lines.clone(),
            _ => return Err(PublishError::Closed(self.name.clone())),
        };

        let mut submitted = 0u64;
        for line in split_lines(chunk) {
            // 파서 입력이 가득 차면 여기서 대기 (backpressure)
            lines
                .send(line.to_owned())
                .await
                .map_err(|_| PublishError::ChannelClosed)?;
            submitted += 1;
        }

        if submitted > 0 {
            counter!(m::PUBLISHER_LINES_RECEIVED_TOTAL).increment(submitted);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        match self.state.close() {
            SinkState::Closed => {
                error!(publisher = %self.name, "close called more than once");
                Err(PublishError::Closed(self.name.clone()))
            }
            SinkState::Uninitialized => {
                debug!(publisher = %self.name, "closing publisher that was never written to");
                Ok(())
            }
            SinkState::Initialized(Running {
                lines,
                parser_task,
                send_task,
            }) => {
                info!(publisher = %self.name, "closing publisher, draining in-flight events");

                // 라인 채널을 닫으면 파서가 드레인 후 이벤트 채널을 닫고,
                // send 태스크가 남은 이벤트를 보낸 뒤 종료합니다.
                drop(lines);

                let parser_result = parser_task.await;
                if let Err(e) = &parser_result {
                    error!(publisher = %self.name, error = %e, "parser task failed");
                }

                let mut client = send_task.await.map_err(|e| PublishError::TaskFailed {
                    task: "send",
                    reason: e.to_string(),
                })?;

                client.close().await?;

                parser_result.map_err(|e| PublishError::TaskFailed {
                    task: "parser",
                    reason: e.to_string(),
                })?;

                info!(publisher = %self.name, "publisher closed, all events flushed");
                Ok(())
            }
        }
    }
}

impl Drop for StreamingPublisher {
    fn drop(&mut self) {
        if let SinkState::Initialized(_) = self.state {
            warn!(
                publisher = %self.name,
                "publisher dropped without close; in-flight events may not be flushed"
            );
        }
    }
}

/// send 태스크 본체
///
/// 이벤트 채널이 닫힐 때까지 샘플링 + 보강 + 전송을 반복합니다. 이벤트 단위
/// 에러는 로그로 남기고 다음 이벤트로 넘어갑니다. 종료 시 클라이언트를
/// 돌려주어 `close`가 플러시할 수 있게 합니다.
async fn run_send_loop(
    mut events: mpsc::Receiver<Event>,
    enricher: Arc<Enricher>,
    mut sampler: Sampler,
    mut client: Box<dyn SinkClient>,
    publisher: String,
) -> Box<dyn SinkClient> {
    let sink = client.name().to_owned();
    debug!(publisher = %publisher, sink = %sink, "send loop started");

    let mut sent = 0u64;
    let mut dropped = 0u64;
    let mut sampled_out = 0u64;

    while let Some(event) = events.recv().await {
        counter!(m::PUBLISHER_EVENTS_PARSED_TOTAL).increment(1);

        // 남긴 이벤트는 sample_rate 가중치로 나머지를 대표
        if !sampler.keep() {
            sampled_out += 1;
            counter!(m::PUBLISHER_EVENTS_SAMPLED_OUT_TOTAL).increment(1);
            continue;
        }

        let Enriched {
            record,
            errors,
            scrubbed,
        } = enricher.enrich(event);

        if scrubbed {
            counter!(m::PUBLISHER_FIELDS_SCRUBBED_TOTAL).increment(1);
        }

        for err in &errors {
            error!(
                publisher = %publisher,
                record = ?record,
                error = %err,
                "unexpected error adding fields to event"
            );
            counter!(m::PUBLISHER_FIELD_ERRORS_TOTAL).increment(1);
        }

        match client.send(&record).await {
            Ok(()) => {
                sent += 1;
                counter!(m::PUBLISHER_EVENTS_SENT_TOTAL, m::LABEL_SINK => sink.clone()).increment(1);
            }
            Err(e) => {
                dropped += 1;
                error!(
                    publisher = %publisher,
                    record = ?record,
                    error = %e,
                    "unexpected error sending event"
                );
                counter!(m::PUBLISHER_EVENTS_DROPPED_TOTAL, m::LABEL_SINK => sink.clone()).increment(1);
            }
        }
    }

    debug!(
        publisher = %publisher,
        sent,
        dropped,
        sampled_out,
        "event stream closed, send loop finished"
    );
    client
}

/// 스트리밍 퍼블리셔 빌더
pub struct StreamingPublisherBuilder {
    name: Option<String>,
    factory: Arc<dyn SinkClientFactory>,
    parser: Arc<dyn LineParser>,
    enricher: Enricher,
    sample_seed: Option<u64>,
    line_capacity: usize,
    event_capacity: usize,
}

impl StreamingPublisherBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new(factory: Arc<dyn SinkClientFactory>, parser: Arc<dyn LineParser>) -> Self {
        Self {
            name: None,
            factory,
            parser,
            enricher: Enricher::default(),
            sample_seed: None,
            line_capacity: DEFAULT_CHANNEL_CAPACITY,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// 퍼블리셔 이름을 지정합니다. 기본값은 싱크 이름입니다.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 보강기를 통째로 지정합니다.
    pub fn enricher(mut self, enricher: Enricher) -> Self {
        self.enricher = enricher;
        self
    }

    /// extra fields를 설정합니다.
    pub fn extra_fields(mut self, fields: FieldMap) -> Self {
        self.enricher = self.enricher.with_extra_fields(fields);
        self
    }

    /// 지정한 필드를 스크러빙합니다.
    pub fn scrub_field(mut self, field: impl Into<String>) -> Self {
        self.enricher = self.enricher.with_scrub_field(field);
        self
    }

    /// 사전 샘플링 비율을 설정합니다.
    ///
    /// N이면 이벤트 N개 중 1개만 보내고, 보낸 레코드에 N을 기록합니다.
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.enricher = self.enricher.with_sample_rate(sample_rate);
        self
    }

    /// 샘플러 시드를 고정합니다.
    pub fn sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }

    /// 라인 채널 용량을 설정합니다.
    pub fn line_capacity(mut self, capacity: usize) -> Self {
        self.line_capacity = capacity;
        self
    }

    /// 이벤트 채널 용량을 설정합니다.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// 퍼블리셔를 빌드합니다. 싱크 클라이언트는 첫 write에서 생성됩니다.
    pub fn build(self) -> Result<StreamingPublisher, PublishError> {
        for (field, value) in [
            ("line_capacity", self.line_capacity),
            ("event_capacity", self.event_capacity),
        ] {
            if value == 0 {
                return Err(PublishError::Config {
                    field: field.to_owned(),
                    reason: "must be greater than 0".to_owned(),
                });
            }
        }

        Ok(StreamingPublisher {
            name: self.name.unwrap_or_else(|| self.factory.name().to_owned()),
            parser: self.parser,
            factory: self.factory,
            enricher: Arc::new(self.enricher),
            sample_seed: self.sample_seed,
            line_capacity: self.line_capacity,
            event_capacity: self.event_capacity,
            state: SinkState::Uninitialized,
        })
    }
}
