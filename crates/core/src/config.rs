//! 설정 관리 -- webwatch.toml 파싱 및 런타임 설정
//!
//! [`WebwatchConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`WEBWATCH_SERVER_BIND_ADDR=127.0.0.1:9000` 형식)
//! 3. 설정 파일 (`webwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), webwatch_core::error::WebwatchError> {
//! use webwatch_core::config::WebwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = WebwatchConfig::load("webwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = WebwatchConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, WebwatchError};

/// webwatch 통합 설정
///
/// `webwatch.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 구성 요소는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 분류기 설정
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// 실시간 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 배치 처리 설정
    #[serde(default)]
    pub batch: BatchConfig,
    /// 통계 조회 설정
    #[serde(default)]
    pub stats: StatsConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl WebwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, WebwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, WebwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WebwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                WebwatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, WebwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            WebwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `WEBWATCH_{SECTION}_{FIELD}`
    /// 예: `WEBWATCH_CLASSIFIER_MODEL_PATH=/opt/webwatch/model.json`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "WEBWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "WEBWATCH_GENERAL_LOG_FORMAT");

        // Classifier
        override_string(
            &mut self.classifier.model_path,
            "WEBWATCH_CLASSIFIER_MODEL_PATH",
        );

        // Server
        override_string(&mut self.server.bind_addr, "WEBWATCH_SERVER_BIND_ADDR");
        override_usize(
            &mut self.server.channel_capacity,
            "WEBWATCH_SERVER_CHANNEL_CAPACITY",
        );
        override_u64(
            &mut self.server.delivery_timeout_ms,
            "WEBWATCH_SERVER_DELIVERY_TIMEOUT_MS",
        );
        override_bool(
            &mut self.server.echo_to_sender,
            "WEBWATCH_SERVER_ECHO_TO_SENDER",
        );

        // Batch
        override_string(&mut self.batch.payload_dir, "WEBWATCH_BATCH_PAYLOAD_DIR");
        override_string(&mut self.batch.output_dir, "WEBWATCH_BATCH_OUTPUT_DIR");

        // Stats
        override_string(&mut self.stats.alert_file, "WEBWATCH_STATS_ALERT_FILE");
        override_usize(&mut self.stats.read_limit, "WEBWATCH_STATS_READ_LIMIT");
        override_usize(
            &mut self.stats.default_event_limit,
            "WEBWATCH_STATS_DEFAULT_EVENT_LIMIT",
        );
        override_usize(
            &mut self.stats.max_event_limit,
            "WEBWATCH_STATS_MAX_EVENT_LIMIT",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "WEBWATCH_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "WEBWATCH_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "WEBWATCH_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), WebwatchError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.classifier.model_path.trim().is_empty() {
            return Err(invalid("classifier.model_path", "must not be empty"));
        }

        if self.server.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(invalid(
                "server.bind_addr",
                format!("'{}' is not a socket address", self.server.bind_addr),
            ));
        }

        if self.server.channel_capacity == 0 {
            return Err(invalid("server.channel_capacity", "must be greater than 0"));
        }

        if self.server.delivery_timeout_ms == 0 {
            return Err(invalid(
                "server.delivery_timeout_ms",
                "must be greater than 0",
            ));
        }

        if self.stats.read_limit == 0 {
            return Err(invalid("stats.read_limit", "must be greater than 0"));
        }

        if self.stats.default_event_limit == 0
            || self.stats.default_event_limit > self.stats.max_event_limit
        {
            return Err(invalid(
                "stats.default_event_limit",
                format!("must be 1-{}", self.stats.max_event_limit),
            ));
        }

        if self.metrics.enabled && self.metrics.endpoint != "/metrics" {
            return Err(invalid(
                "metrics.endpoint",
                "only '/metrics' is currently supported",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> WebwatchError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 분류기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// 모델 아티팩트(JSON 번들) 경로
    pub model_path: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: "models/model.json".to_owned(),
        }
    }
}

/// 실시간 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP/WebSocket 바인드 주소
    pub bind_addr: String,
    /// 구독자당 전송 채널 용량
    pub channel_capacity: usize,
    /// 구독자 한 명에게 전달을 기다리는 최대 시간 (밀리초)
    pub delivery_timeout_ms: u64,
    /// 이벤트를 보낸 연결에도 알림을 되돌려 보낼지 여부
    pub echo_to_sender: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_owned(),
            channel_capacity: 64,
            delivery_timeout_ms: 1_000,
            echo_to_sender: false,
        }
    }
}

/// 배치 처리 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// 입력 경로가 없을 때 찾아볼 페이로드 디렉토리
    pub payload_dir: String,
    /// 결과 파일 출력 디렉토리
    pub output_dir: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            payload_dir: "payloads".to_owned(),
            output_dir: "results".to_owned(),
        }
    }
}

/// 통계 조회 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// 통계를 계산할 JSONL 결과 파일
    pub alert_file: String,
    /// 파일 끝에서부터 읽을 최대 레코드 수
    pub read_limit: usize,
    /// 최근 이벤트 기본 개수
    pub default_event_limit: usize,
    /// 최근 이벤트 최대 개수
    pub max_event_limit: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            alert_file: "results/alert_results.jsonl".to_owned(),
            read_limit: 5_000,
            default_event_limit: 100,
            max_event_limit: 1_000,
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리스너 주소
    pub listen_addr: String,
    /// 리스너 포트
    pub port: u16,
    /// 스크레이프 엔드포인트
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
