#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`normalizer`]: 스키마가 제각각인 원시 이벤트를 고정 레코드로 정규화
//! - [`features`]: 요청 텍스트 디코딩과 수치 특징 벡터 추출
//! - [`classifier`]: 지연 로딩되는 선형 모델 분류기
//! - [`severity`]: 카테고리 기본 점수 + 특징 가산점으로 심각도 산출
//! - [`assembler`]: 이벤트 하나를 알림 레코드로 조립
//! - [`hub`]: 연결된 구독자에게 알림 브로드캐스트
//! - [`batch`]: 대량 파일 입력과 결과 파일 저장
//! - [`stats`]: 저장된 결과 파일 요약과 최근 이벤트 조회
//! - [`config`]: 탐지 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! raw event -> LogNormalizer -> FeatureExtractor -> ClassifierClient -> severity -> AlertRecord
//!                  |                  |                    |                            |
//!           time/ip/method/url   decode + signals     linear model             Hub / ResultSink
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod hub;
pub mod normalizer;
pub mod severity;

pub mod batch;
pub mod classifier;
pub mod features;
pub mod stats;

// --- 주요 타입 re-export ---

// 조립 / 브로드캐스트
pub use assembler::AlertAssembler;
pub use hub::{AlertBroadcastHub, PublishReport, SubscriberId, Subscription};

// 설정
pub use config::DetectConfig;

// 에러
pub use error::DetectError;

// 정규화 / 특징
pub use features::{FeatureExtractor, FeatureVector};
pub use normalizer::LogNormalizer;

// 분류기
pub use classifier::{ClassifierClient, LinearModel};

// 배치
pub use batch::{BatchIngestor, IngestOutcome, PersistReport, persist_all, persist_filtered};

// 통계
pub use stats::{EventRow, StatsSummary, read_recent, recent_events, summarize};
