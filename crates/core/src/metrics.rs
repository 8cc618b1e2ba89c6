//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `webwatch_`
//! - 구성 요소: `detect_`, `hub_`, `batch_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use webwatch_core::metrics as m;
//!
//! metrics::counter!(m::DETECT_EVENTS_ASSEMBLED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 공격 카테고리 레이블 키
pub const LABEL_CATEGORY: &str = "category";

/// 심각도 등급 레이블 키 (safe, low, medium, high, critical)
pub const LABEL_LEVEL: &str = "level";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Detect 메트릭 ──────────────────────────────────────────────────

/// Detect: 알림으로 조립된 이벤트 수 (counter, labels: category, level)
pub const DETECT_EVENTS_ASSEMBLED_TOTAL: &str = "webwatch_detect_events_assembled_total";

/// Detect: 분류기 호출 실패 수 (counter)
pub const DETECT_CLASSIFIER_ERRORS_TOTAL: &str = "webwatch_detect_classifier_errors_total";

/// Detect: 이벤트 하나를 조립하는 데 걸린 시간 (histogram, 초)
pub const DETECT_ASSEMBLY_DURATION_SECONDS: &str = "webwatch_detect_assembly_duration_seconds";

// ─── Hub 메트릭 ─────────────────────────────────────────────────────

/// Hub: 현재 연결된 구독자 수 (gauge)
pub const HUB_SUBSCRIBERS: &str = "webwatch_hub_subscribers";

/// Hub: 구독자 전달 시도 수 (counter, label: result)
pub const HUB_DELIVERIES_TOTAL: &str = "webwatch_hub_deliveries_total";

/// Hub: 전달 실패로 제거된 구독자 수 (counter)
pub const HUB_SUBSCRIBERS_PRUNED_TOTAL: &str = "webwatch_hub_subscribers_pruned_total";

// ─── Batch 메트릭 ───────────────────────────────────────────────────

/// Batch: 정규화된 입력 레코드 수 (counter)
pub const BATCH_RECORDS_INGESTED_TOTAL: &str = "webwatch_batch_records_ingested_total";

/// Batch: 건너뛴 잘못된 줄 수 (counter)
pub const BATCH_LINES_SKIPPED_TOTAL: &str = "webwatch_batch_lines_skipped_total";

/// Batch: 저장된 알림 레코드 수 (counter)
pub const BATCH_RECORDS_PERSISTED_TOTAL: &str = "webwatch_batch_records_persisted_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "webwatch_daemon_build_info";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 조립 지연 시간 히스토그램 버킷 (초)
///
/// 10us ~ 1s 범위, 로그 단위 분포
pub const ASSEMBLY_DURATION_BUCKETS: [f64; 8] =
    [0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.01, 0.1, 1.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `webwatch-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Detect
    describe_counter!(
        DETECT_EVENTS_ASSEMBLED_TOTAL,
        "Total number of raw events turned into alert records"
    );
    describe_counter!(
        DETECT_CLASSIFIER_ERRORS_TOTAL,
        "Total number of failed classifier invocations"
    );
    describe_histogram!(
        DETECT_ASSEMBLY_DURATION_SECONDS,
        "Time to normalize, extract, classify and score one event in seconds"
    );

    // Hub
    describe_gauge!(HUB_SUBSCRIBERS, "Number of live alert subscribers");
    describe_counter!(
        HUB_DELIVERIES_TOTAL,
        "Alert delivery attempts to subscribers by result"
    );
    describe_counter!(
        HUB_SUBSCRIBERS_PRUNED_TOTAL,
        "Total number of subscribers removed after a failed delivery"
    );

    // Batch
    describe_counter!(
        BATCH_RECORDS_INGESTED_TOTAL,
        "Total number of records normalized from bulk files"
    );
    describe_counter!(
        BATCH_LINES_SKIPPED_TOTAL,
        "Total number of malformed bulk lines skipped"
    );
    describe_counter!(
        BATCH_RECORDS_PERSISTED_TOTAL,
        "Total number of alert records written to result files"
    );

    // Daemon
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
