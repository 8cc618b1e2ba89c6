//! 에러 타입 -- 도메인별 에러 정의

/// webwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum WebwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 분류기 에러
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// 탐지 파이프라인 처리 에러
    #[error("detection error: {0}")]
    Detection(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 분류기 에러
///
/// 모델 로딩 실패와 예측 실패는 호출한 작업까지 그대로 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// 모델 아티팩트 로딩 실패
    #[error("failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    /// 예측 실패
    #[error("prediction failed: {0}")]
    Prediction(String),

    /// 레이블 맵에 없는 클래스 인덱스
    #[error("no label for class index {0}")]
    UnknownLabel(usize),
}
