//! 전송 태스크 -- 이벤트를 배치로 묶어 HTTP 배치 API로 보냅니다.
//!
//! 배치는 `batch_size`개가 차거나 `batch_timeout`이 지나면 전송됩니다.
//! 입력 채널이 닫히면 남은 배치를 보내고 통계를 반환하며 종료합니다.
//! 전송 실패와 이벤트 단위 거부는 로그와 메트릭으로만 남기며 재시도하지 않습니다.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use logship_core::event::{FieldMap, SinkRecord};
use logship_core::metrics as m;

/// write key 헤더
pub const WRITE_KEY_HEADER: &str = "X-Honeycomb-Team";

/// 배치 API에 실리는 이벤트 하나
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct BatchEvent {
    /// 이벤트 시각 (RFC 3339)
    pub(crate) time: DateTime<Utc>,
    /// 사전 샘플링 비율
    pub(crate) samplerate: u32,
    /// 이벤트 필드
    pub(crate) data: FieldMap,
}

impl From<&SinkRecord> for BatchEvent {
    fn from(record: &SinkRecord) -> Self {
        Self {
            time: record.timestamp,
            samplerate: record.sample_rate,
            data: record.data.clone(),
        }
    }
}

/// 배치 응답의 이벤트별 결과
#[derive(Debug, Deserialize)]
struct EventStatus {
    status: u16,
    #[serde(default)]
    error: Option<String>,
}

/// 전송 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmissionStats {
    /// 보낸 배치 수
    pub batches: u64,
    /// 수락된 이벤트 수
    pub accepted: u64,
    /// 거부되었거나 전송에 실패한 이벤트 수
    pub rejected: u64,
}

/// 전송 태스크 본체
pub(crate) struct Transmission {
    pub(crate) http: reqwest::Client,
    pub(crate) url: Url,
    pub(crate) write_key: String,
    pub(crate) batch_size: usize,
    pub(crate) batch_timeout: Duration,
    pub(crate) rx: mpsc::Receiver<BatchEvent>,
}

impl Transmission {
    /// 입력 채널이 닫힐 때까지 배치 전송을 반복합니다.
    pub(crate) async fn run(mut self) -> TransmissionStats {
        debug!(
            url = %self.url,
            batch_size = self.batch_size,
            batch_timeout_ms = self.batch_timeout.as_millis() as u64,
            "transmission started"
        );

        let mut stats = TransmissionStats::default();
        let mut batch: Vec<BatchEvent> = Vec::with_capacity(self.batch_size);

        let mut ticker = tokio::time::interval(self.batch_timeout);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // 첫 tick은 즉시 완료되므로 소비
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !batch.is_empty() {
                        trace!(pending = batch.len(), "batch timeout reached");
                        self.flush(&mut batch, &mut stats).await;
                    }
                }
                event = self.rx.recv() => {
                    match event {
                        Some(event) => {
                            batch.push(event);
                            if batch.len() >= self.batch_size {
                                self.flush(&mut batch, &mut stats).await;
                                ticker.reset();
                            }
                        }
                        None => {
                            self.flush(&mut batch, &mut stats).await;
                            break;
                        }
                    }
                }
            }
        }

        debug!(
            batches = stats.batches,
            accepted = stats.accepted,
            rejected = stats.rejected,
            "transmission finished"
        );
        stats
    }

    /// 현재 배치를 전송하고 비웁니다.
    async fn flush(&self, batch: &mut Vec<BatchEvent>, stats: &mut TransmissionStats) {
        if batch.is_empty() {
            return;
        }
        let events = std::mem::take(batch);
        let count = events.len() as u64;
        let started = Instant::now();

        let result = self
            .http
            .post(self.url.clone())
            .header(WRITE_KEY_HEADER, &self.write_key)
            .json(&events)
            .send()
            .await;

        histogram!(m::TRANSMISSION_BATCH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        stats.batches += 1;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(events = count, error = %e, "batch transmission failed, dropping events");
                self.record_failure(count, stats);
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                events = count,
                status = status.as_u16(),
                body = %body,
                "batch rejected by server, dropping events"
            );
            self.record_failure(count, stats);
            return;
        }

        let rejected = match response.json::<Vec<EventStatus>>().await {
            Ok(statuses) => count_rejected(&statuses),
            Err(e) => {
                // 상태 코드는 성공이므로 전체를 수락된 것으로 간주
                debug!(error = %e, "unreadable batch response body");
                0
            }
        };

        let rejected = rejected.min(count);
        stats.accepted += count - rejected;
        stats.rejected += rejected;
        counter!(m::TRANSMISSION_BATCHES_TOTAL, m::LABEL_RESULT => "success").increment(1);
        if rejected > 0 {
            counter!(m::TRANSMISSION_EVENTS_REJECTED_TOTAL).increment(rejected);
        }
        trace!(events = count, rejected, "batch sent");
    }

    fn record_failure(&self, count: u64, stats: &mut TransmissionStats) {
        stats.rejected += count;
        counter!(m::TRANSMISSION_BATCHES_TOTAL, m::LABEL_RESULT => "failure").increment(1);
        counter!(m::TRANSMISSION_EVENTS_REJECTED_TOTAL).increment(count);
    }
}

/// 이벤트별 응답에서 거부된 수를 세고 경고를 남깁니다.
fn count_rejected(statuses: &[EventStatus]) -> u64 {
    let mut rejected = 0u64;
    for (index, entry) in statuses.iter().enumerate() {
        if !(200..300).contains(&entry.status) {
            rejected += 1;
            warn!(
                index,
                status = entry.status,
                error = entry.error.as_deref().unwrap_or(""),
                "event rejected by server"
            );
        }
    }
    rejected
}
