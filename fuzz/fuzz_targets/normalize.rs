#![no_main]

use libfuzzer_sys::fuzz_target;
use webwatch_detect::LogNormalizer;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(normalizer) = LogNormalizer::new() else {
        return;
    };

    // 어떤 JSON 값이든 기본값이 채워진 레코드가 나와야 함
    let record = normalizer.normalize(&raw);
    assert!(!record.time.is_empty());
    assert!(!record.ip.is_empty());
    assert!(!record.method.is_empty());
});
