//! 알림 조립 -- 원시 이벤트 하나를 알림 레코드로 변환
//!
//! 정규화 → 디코딩/특징 추출 → 분류 → 채점 순서로 처리합니다.
//! 이벤트 사이에 공유하는 가변 상태가 없으므로 여러 태스크에서 동시에 호출할 수 있습니다.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error};

use webwatch_core::metrics as m;
use webwatch_core::pipeline::Classifier;
use webwatch_core::types::{AlertRecord, NormalizedRecord};

use crate::error::DetectError;
use crate::features::FeatureExtractor;
use crate::normalizer::LogNormalizer;
use crate::severity;

/// 알림 조립기
#[derive(Clone)]
pub struct AlertAssembler {
    normalizer: LogNormalizer,
    extractor: FeatureExtractor,
    classifier: Arc<dyn Classifier>,
}

impl AlertAssembler {
    /// 분류기를 받아 조립기를 생성합니다.
    pub fn new(classifier: Arc<dyn Classifier>) -> Result<Self, DetectError> {
        Ok(Self {
            normalizer: LogNormalizer::new()?,
            extractor: FeatureExtractor::new()?,
            classifier,
        })
    }

    /// 정규화기
    pub fn normalizer(&self) -> &LogNormalizer {
        &self.normalizer
    }

    /// 원시 이벤트를 정규화합니다.
    pub fn normalize(&self, raw: &Value) -> NormalizedRecord {
        self.normalizer.normalize(raw)
    }

    /// 원시 이벤트 하나를 알림 레코드로 조립합니다.
    ///
    /// 분류기 실패는 복구하지 않고 그대로 반환합니다.
    pub fn assemble(&self, raw: &Value) -> Result<AlertRecord, DetectError> {
        self.assemble_record(self.normalize(raw))
    }

    /// 이미 정규화된 레코드를 알림 레코드로 조립합니다.
    pub fn assemble_record(&self, record: NormalizedRecord) -> Result<AlertRecord, DetectError> {
        let started = Instant::now();

        let (decoded, features) = self.extractor.decode_and_extract(&record.url, &record.body);
        let classification = self
            .classifier
            .classify(&decoded, &features.as_pairs())
            .map_err(|e| {
                metrics::counter!(m::DETECT_CLASSIFIER_ERRORS_TOTAL).increment(1);
                error!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "classification failed"
                );
                e
            })?;
        let (score, tier) = severity::score(classification.category, &features);

        let alert = AlertRecord::new(record, classification, score, tier);

        metrics::histogram!(m::DETECT_ASSEMBLY_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        metrics::counter!(
            m::DETECT_EVENTS_ASSEMBLED_TOTAL,
            m::LABEL_CATEGORY => alert.attack.slug(),
            m::LABEL_LEVEL => alert.level.to_string().to_lowercase()
        )
        .increment(1);

        debug!(
            attack = %alert.attack,
            severity = alert.severity,
            level = %alert.level,
            ip = %alert.ip,
            "alert assembled"
        );

        Ok(alert)
    }
}

impl std::fmt::Debug for AlertAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertAssembler")
            .field("classifier", &self.classifier.name())
            .finish()
    }
}
