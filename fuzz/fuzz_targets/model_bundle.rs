#![no_main]

use libfuzzer_sys::fuzz_target;

use webwatch_detect::classifier::{LinearModel, ModelBundle};

fuzz_target!(|data: &[u8]| {
    // 모델 번들 파싱/검증은 실패할 수 있지만 패닉은 안 됨
    let Ok(bundle) = serde_json::from_slice::<ModelBundle>(data) else {
        return;
    };
    let Ok(model) = LinearModel::from_bundle(bundle) else {
        return;
    };

    if let Ok(result) = model.predict("select * from users where id=1", &[("sql_keywords", 2.0)]) {
        assert!(result.confidence.is_finite());
    }
});
