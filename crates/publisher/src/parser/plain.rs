//! 평문 라인 파서
//!
//! 라인 전체를 `message` 필드로 담고 수신 시각을 타임스탬프로 사용합니다.
//! 구조가 없는 로그를 그대로 전달할 때 사용합니다.

use tokio::sync::mpsc;

use logship_core::event::{Event, FieldMap};
use logship_core::pipeline::{BoxFuture, LineParser};

use super::decode_each;

/// 메시지 필드 이름
pub const MESSAGE_FIELD: &str = "message";

/// 평문 라인 파서
#[derive(Debug, Clone)]
pub struct PlainLineParser {
    /// 줄 끝 `\r` 제거 여부
    trim_cr: bool,
}

impl PlainLineParser {
    /// CRLF의 `\r`을 제거하는 파서를 생성합니다.
    pub fn new() -> Self {
        Self { trim_cr: true }
    }

    /// 라인을 원문 그대로 보존하는 파서를 생성합니다.
    pub fn raw() -> Self {
        Self { trim_cr: false }
    }

    fn to_event(&self, line: &str) -> Event {
        let message = if self.trim_cr {
            line.strip_suffix('\r').unwrap_or(line)
        } else {
            line
        };
        let mut data = FieldMap::new();
        data.insert(MESSAGE_FIELD.to_owned(), message.into());
        Event::now(data)
    }
}

impl Default for PlainLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser for PlainLineParser {
    fn format_name(&self) -> &str {
        "plain"
    }

    fn process_lines(
        &self,
        lines: mpsc::Receiver<String>,
        events: mpsc::Sender<Event>,
    ) -> BoxFuture<'_, ()> {
        Box::pin(decode_each(self.format_name(), lines, events, move |line| {
            Ok(Some(self.to_event(line)))
        }))
    }
}
