#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use webwatch_core::types::Category;
use webwatch_detect::{FeatureExtractor, severity};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzRequest {
    url: String,
    body: String,
    category: u8,
}

fuzz_target!(|input: FuzzRequest| {
    let Ok(extractor) = FeatureExtractor::new() else {
        return;
    };

    let (decoded, features) = extractor.decode_and_extract(&input.url, &input.body);

    // 공백은 정리된 상태
    assert_eq!(decoded.trim(), decoded);
    assert!(!decoded.contains("  "));
    assert!(features.as_pairs().iter().all(|(_, v)| v.is_finite()));

    let category = Category::ALL[usize::from(input.category) % Category::ALL.len()];
    let (score, _) = severity::score(category, &features);
    assert!(score <= 100);
});
