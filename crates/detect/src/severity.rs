//! 심각도 점수 -- 카테고리와 특징으로 0~100 위험 점수와 등급을 계산
//!
//! 카테고리별 기본 점수에 신호 가산점을 더한 뒤 100으로 자릅니다.
//! 가산 규칙은 7개 신호만 참조합니다.

use webwatch_core::types::{Category, SeverityTier};

use crate::features::FeatureVector;

/// 최대 점수
pub const MAX_SCORE: u8 = 100;

/// 카테고리별 기본 점수
pub fn base_score(category: Category) -> u8 {
    match category {
        Category::Benign => 0,
        Category::SqlInjection => 85,
        Category::Xss => 50,
        Category::CommandInjection => 95,
        Category::BrokenAuthentication => 70,
    }
}

/// 가산 규칙: (조건, 가산점)
///
/// 각 규칙은 조건이 참이면 한 번만 적용됩니다.
const BONUSES: [(fn(&FeatureVector) -> bool, u8); 7] = [
    (|f| f.entropy > 4.0, 10),
    (|f| f.base64_chunk_count > 0, 5),
    (|f| f.shell_pattern_count > 0, 10),
    (|f| f.path_traversal_count > 0, 10),
    (|f| f.xss_event_count > 0, 5),
    (|f| f.cmd_special_count > 0, 5),
    (|f| f.sql_comment_count > 0, 5),
];

/// 점수와 등급을 계산합니다.
pub fn score(category: Category, features: &FeatureVector) -> (u8, SeverityTier) {
    let bonus: u32 = BONUSES
        .iter()
        .filter(|(triggered, _)| triggered(features))
        .map(|(_, points)| u32::from(*points))
        .sum();

    let total = (u32::from(base_score(category)) + bonus).min(u32::from(MAX_SCORE));
    // min으로 100 이하가 보장됨
    let total = u8::try_from(total).unwrap_or(MAX_SCORE);

    (total, SeverityTier::from_score(total))
}
