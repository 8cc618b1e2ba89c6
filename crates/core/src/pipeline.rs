//! 파이프라인 trait -- 모듈 확장 포인트 정의

use crate::error::ClassifierError;
use crate::types::ClassificationResult;

/// 분류기 trait
///
/// 디코딩된 요청 텍스트와 수치 특징을 받아 카테고리와 신뢰도를 반환합니다.
/// 실제 모델 클라이언트 외에 테스트용 고정 분류기도 이 trait을 구현합니다.
pub trait Classifier: Send + Sync {
    /// 분류기 이름
    fn name(&self) -> &str;

    /// 디코딩된 텍스트를 분류합니다.
    ///
    /// `features`는 `(특징 이름, 값)` 쌍이며 분류기가 필요한 열만 골라 씁니다.
    fn classify(
        &self,
        decoded: &str,
        features: &[(&'static str, f64)],
    ) -> Result<ClassificationResult, ClassifierError>;
}
