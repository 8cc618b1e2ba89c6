//! 탐지 파이프라인 에러 타입
//!
//! [`DetectError`]는 탐지 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<DetectError> for WebwatchError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use webwatch_core::error::{ClassifierError, WebwatchError};

/// 탐지 파이프라인 도메인 에러
///
/// 분류기 호출, 배치 입력 읽기, 결과 저장, 설정 검증 등
/// 파이프라인 내부의 에러 상황을 포괄합니다.
/// 정규화와 특징 추출은 전함수이므로 여기에 해당하는 변형이 없습니다.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// 분류기 에러 (모델 로딩 실패, 예측 실패)
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// 배치 입력 파일을 읽을 수 없음
    #[error("ingest error: {path}: {reason}")]
    Ingest {
        /// 입력 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 결과 파일 저장 실패
    #[error("persist error: {path}: {reason}")]
    Persist {
        /// 출력 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러 (구독자에게 알림을 내보내는 쪽)
    #[error("channel error: {0}")]
    Channel(String),

    /// 블로킹 작업 스레드 실패
    #[error("task error: {0}")]
    Task(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 직렬화 에러
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV 읽기/쓰기 에러
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<DetectError> for WebwatchError {
    fn from(err: DetectError) -> Self {
        match err {
            DetectError::Classifier(e) => WebwatchError::Classifier(e),
            DetectError::Io(e) => WebwatchError::Io(e),
            other => WebwatchError::Detection(other.to_string()),
        }
    }
}
