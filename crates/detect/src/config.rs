//! 탐지 파이프라인 설정
//!
//! [`DetectConfig`]는 core의 [`WebwatchConfig`](webwatch_core::config::WebwatchConfig)
//! 섹션들을 기반으로 탐지 파이프라인 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use webwatch_core::config::WebwatchConfig;
//! use webwatch_detect::config::DetectConfig;
//!
//! let core_config = WebwatchConfig::default();
//! let config = DetectConfig::from_core(&core_config);
//! ```

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DetectError;

/// 탐지 파이프라인 설정
///
/// core의 `classifier`, `server`, `batch`, `stats` 섹션에서 파생되며,
/// 결과 파일 이름처럼 파이프라인 내부에서만 쓰는 설정을 추가로 가집니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
    /// 모델 번들 경로
    pub model_path: String,
    /// 구독자당 채널 용량
    pub channel_capacity: usize,
    /// 구독자 전달 최대 대기 시간 (밀리초)
    pub delivery_timeout_ms: u64,
    /// 보낸 연결에도 알림을 돌려보낼지 여부
    pub echo_to_sender: bool,
    /// 페이로드 디렉토리 (입력 경로 폴백)
    pub payload_dir: String,
    /// 결과 출력 디렉토리
    pub output_dir: String,
    /// 통계 대상 JSONL 파일
    pub alert_file: String,
    /// 통계 계산 시 읽을 최대 레코드 수
    pub read_limit: usize,
    /// 최근 이벤트 기본 개수
    pub default_event_limit: usize,
    /// 최근 이벤트 최대 개수
    pub max_event_limit: usize,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 표 형식 결과 파일 이름
    pub table_file_name: String,
    /// 줄 단위 결과 파일 이름
    pub lines_file_name: String,
    /// Broken Authentication 의심 레코드 파일 이름
    pub suspect_file_name: String,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            model_path: "models/model.json".to_owned(),
            channel_capacity: 64,
            delivery_timeout_ms: 1_000,
            echo_to_sender: false,
            payload_dir: "payloads".to_owned(),
            output_dir: "results".to_owned(),
            alert_file: "results/alert_results.jsonl".to_owned(),
            read_limit: 5_000,
            default_event_limit: 100,
            max_event_limit: 1_000,
            table_file_name: "alert_results.csv".to_owned(),
            lines_file_name: "alert_results.jsonl".to_owned(),
            suspect_file_name: "suspect_broken_auth.jsonl".to_owned(),
        }
    }
}

impl DetectConfig {
    /// core 설정에서 탐지 파이프라인 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &webwatch_core::config::WebwatchConfig) -> Self {
        Self {
            model_path: core.classifier.model_path.clone(),
            channel_capacity: core.server.channel_capacity,
            delivery_timeout_ms: core.server.delivery_timeout_ms,
            echo_to_sender: core.server.echo_to_sender,
            payload_dir: core.batch.payload_dir.clone(),
            output_dir: core.batch.output_dir.clone(),
            alert_file: core.stats.alert_file.clone(),
            read_limit: core.stats.read_limit,
            default_event_limit: core.stats.default_event_limit,
            max_event_limit: core.stats.max_event_limit,
            ..Self::default()
        }
    }

    /// 구독자 전달 타임아웃
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    /// 표 형식 결과 파일 전체 경로
    pub fn table_path(&self) -> PathBuf {
        Path::new(&self.output_dir).join(&self.table_file_name)
    }

    /// 줄 단위 결과 파일 전체 경로
    pub fn lines_path(&self) -> PathBuf {
        Path::new(&self.output_dir).join(&self.lines_file_name)
    }

    /// 의심 레코드 파일 전체 경로
    pub fn suspect_path(&self) -> PathBuf {
        Path::new(&self.output_dir).join(&self.suspect_file_name)
    }

    /// 결과 파일 이름이 출력 디렉토리 밖을 가리키지 않는지 검증합니다.
    ///
    /// # 검증 규칙
    /// - 비어 있지 않아야 함
    /// - 정확히 하나의 일반 경로 컴포넌트여야 함 (구분자, "..", 절대 경로 금지)
    fn validate_file_name(field: &str, name: &str) -> Result<(), DetectError> {
        if name.is_empty() {
            return Err(DetectError::Config {
                field: field.to_owned(),
                reason: "file name must not be empty".to_owned(),
            });
        }

        let mut components = Path::new(name).components();
        let single_normal = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if !single_normal {
            return Err(DetectError::Config {
                field: field.to_owned(),
                reason: format!("'{}' must be a plain file name", name),
            });
        }

        Ok(())
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DetectError> {
        const MAX_CHANNEL_CAPACITY: usize = 65_536;
        const MAX_DELIVERY_TIMEOUT_MS: u64 = 60_000;

        if self.model_path.trim().is_empty() {
            return Err(DetectError::Config {
                field: "model_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(DetectError::Config {
                field: "channel_capacity".to_owned(),
                reason: format!("must be 1-{}", MAX_CHANNEL_CAPACITY),
            });
        }

        if self.delivery_timeout_ms == 0 || self.delivery_timeout_ms > MAX_DELIVERY_TIMEOUT_MS {
            return Err(DetectError::Config {
                field: "delivery_timeout_ms".to_owned(),
                reason: format!("must be 1-{}", MAX_DELIVERY_TIMEOUT_MS),
            });
        }

        if self.output_dir.is_empty() {
            return Err(DetectError::Config {
                field: "output_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.read_limit == 0 {
            return Err(DetectError::Config {
                field: "read_limit".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.default_event_limit == 0 || self.default_event_limit > self.max_event_limit {
            return Err(DetectError::Config {
                field: "default_event_limit".to_owned(),
                reason: format!("must be 1-{}", self.max_event_limit),
            });
        }

        Self::validate_file_name("table_file_name", &self.table_file_name)?;
        Self::validate_file_name("lines_file_name", &self.lines_file_name)?;
        Self::validate_file_name("suspect_file_name", &self.suspect_file_name)?;

        Ok(())
    }
}
