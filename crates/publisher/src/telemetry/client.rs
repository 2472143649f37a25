//! 배치 HTTP 싱크 클라이언트
//!
//! `send`는 레코드를 전송 대기열에 넣고 반환합니다. 대기열이 가득 차면
//! 자리가 날 때까지 대기합니다. `close`는 대기열을 닫고 전송 태스크가
//! 마지막 배치까지 보낸 뒤 종료할 때까지 기다립니다.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use logship_core::error::SinkError;
use logship_core::event::SinkRecord;
use logship_core::pipeline::{BoxFuture, SinkClient};

use super::TELEMETRY_SINK;
use super::transmission::{BatchEvent, Transmission, TransmissionStats};

/// 배치 HTTP 싱크 클라이언트
pub struct HttpEventClient {
    /// 전송 대기열 송신측 (close 후 None)
    queue: Option<mpsc::Sender<BatchEvent>>,
    /// 전송 태스크 (close 후 None)
    task: Option<JoinHandle<TransmissionStats>>,
}

impl HttpEventClient {
    /// 전송 태스크를 스폰하고 클라이언트를 생성합니다.
    pub(crate) fn start(
        queue: mpsc::Sender<BatchEvent>,
        transmission: Transmission,
    ) -> Self {
        let task = tokio::spawn(transmission.run());
        Self {
            queue: Some(queue),
            task: Some(task),
        }
    }

    /// 전송 태스크를 종료하고 통계를 반환합니다.
    ///
    /// 두 번째 호출부터는 빈 통계를 반환합니다.
    pub async fn shutdown(&mut self) -> Result<TransmissionStats, SinkError> {
        drop(self.queue.take());
        let Some(task) = self.task.take() else {
            return Ok(TransmissionStats::default());
        };
        task.await
            .map_err(|e| SinkError::Transport(format!("transmission task failed: {e}")))
    }
}

impl SinkClient for HttpEventClient {
    fn name(&self) -> &str {
        TELEMETRY_SINK
    }

    fn send<'a>(&'a mut self, record: &'a SinkRecord) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            if record.is_empty() {
                return Err(SinkError::EmptyEvent);
            }
            let queue = self.queue.as_ref().ok_or(SinkError::TransmissionClosed)?;
            queue
                .send(BatchEvent::from(record))
                .await
                .map_err(|_| SinkError::TransmissionClosed)
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), SinkError>> {
        Box::pin(async move {
            let stats = self.shutdown().await?;
            info!(
                sink = TELEMETRY_SINK,
                batches = stats.batches,
                accepted = stats.accepted,
                rejected = stats.rejected,
                "telemetry transmission closed"
            );
            Ok::<(), SinkError>(())
        })
    }
}
