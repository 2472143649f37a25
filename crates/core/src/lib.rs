#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pipeline;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LogshipError, ParseError, PipelineError, SinkError};

// 설정
pub use config::{LogshipConfig, OutputKind, ParserKind};

// 이벤트
pub use event::{Event, FieldMap, SinkRecord};

// 파이프라인 trait
pub use pipeline::{BoxFuture, LineParser, SinkClient, SinkClientFactory};
