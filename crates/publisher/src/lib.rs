#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`publisher`]: `Publisher` / `DynPublisher` trait 및 설정 기반 선택
//! - [`stream`]: 파서 태스크 + send 태스크 스트리밍 퍼블리셔
//! - [`enrich`]: 민감 필드 스크러빙, extra fields 병합
//! - [`sample`]: 1/N 사전 샘플링
//! - [`parser`]: JSON / 평문 라인 파서
//! - [`telemetry`]: 배치 HTTP 싱크 클라이언트
//! - [`console`]: 원시 텍스트 / JSON 라인 콘솔 출력
//! - [`chunk`]: 청크 -> 라인 분할
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! write(chunk) -> split_lines -> [parser task] -> [send task] -> SinkClient
//!                                 JSON/plain       sample+scrub   HTTP batch / stdout
//! ```

pub mod chunk;
pub mod console;
pub mod enrich;
pub mod error;
pub mod parser;
pub mod publisher;
pub mod sample;
pub mod stream;
pub mod telemetry;

mod lifecycle;

// --- 주요 타입 re-export ---

// 퍼블리셔
pub use publisher::{DynPublisher, Publisher, build_publisher};
pub use stream::{StreamingPublisher, StreamingPublisherBuilder};

// 콘솔
pub use console::{ConsoleClient, ConsoleClientFactory, PlainConsolePublisher};

// 텔레메트리
pub use telemetry::{HttpClientFactory, HttpEventClient};

// 보강
pub use enrich::{Enricher, scrub_value};
pub use sample::Sampler;

// 파서
pub use parser::{JsonLineParser, PlainLineParser};

// 에러
pub use error::{EnrichError, PublishError};
