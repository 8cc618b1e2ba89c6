//! 속성 기반 테스트 -- 정규화 전함수성과 디코딩 고정점

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use proptest::prelude::*;
use serde_json::{Map, Value};

use webwatch_detect::LogNormalizer;
use webwatch_detect::features::decode;

/// 정규화기가 읽는 키와 관계없는 키를 섞은 후보
const KEYS: &[&str] = &[
    "time", "timestamp", "ts", "ip", "client_ip", "host", "method", "http_method", "url",
    "path", "uri", "body", "data", "headers", "x-forwarded-for", "extra",
];

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12).prop_map(Value::from),
        ".{0,24}".prop_map(Value::String),
    ]
}

/// `depth`번 겹쳐서 퍼센트 인코딩
fn percent_encode_nested(text: &str, depth: usize) -> String {
    (0..depth).fold(text.to_owned(), |acc, _| {
        utf8_percent_encode(&acc, NON_ALPHANUMERIC).to_string()
    })
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((prop::sample::select(KEYS), inner), 0..4).prop_map(|pairs| {
                Value::Object(
                    pairs
                        .into_iter()
                        .map(|(k, v)| (k.to_owned(), v))
                        .collect::<Map<_, _>>(),
                )
            }),
        ]
    })
}

proptest! {
    #[test]
    fn normalize_is_total(raw in arb_value()) {
        let normalizer = LogNormalizer::new().unwrap();
        let record = normalizer.normalize(&raw);
        prop_assert!(!record.time.is_empty());
        prop_assert!(!record.ip.is_empty());
        prop_assert!(!record.method.is_empty());
    }

    #[test]
    fn string_fields_pass_through(url in "[a-z/?=&]{0,32}", body in "[a-z ]{0,32}") {
        let normalizer = LogNormalizer::new().unwrap();
        let raw = serde_json::json!({"url": url.clone(), "body": body.clone()});
        let record = normalizer.normalize(&raw);
        prop_assert_eq!(record.url, url);
        prop_assert_eq!(record.body, body);
    }

    #[test]
    fn decode_is_idempotent(text in "[a-zA-Z0-9 <>/'\"=;+._-]{0,64}") {
        let once = decode(&text);
        prop_assert_eq!(decode(&once), once);
    }

    // `%`, `+`, `&`가 없는 원문은 세 겹까지 인코딩해도 라운드 상한 안에서 완전히 풀림
    #[test]
    fn nested_percent_encoding_reaches_fixed_point(
        text in "[^%+&]{0,48}",
        depth in 1usize..=3,
    ) {
        let plain = decode(&text);
        let decoded = decode(&percent_encode_nested(&text, depth));

        prop_assert_eq!(&decoded, &plain);
        prop_assert_eq!(decode(&decoded), decoded);
    }

    #[test]
    fn every_nesting_depth_decodes_alike(text in "[^%+&]{0,48}") {
        let results: Vec<String> = (1..=3)
            .map(|depth| decode(&percent_encode_nested(&text, depth)))
            .collect();
        prop_assert_eq!(&results[0], &results[1]);
        prop_assert_eq!(&results[1], &results[2]);
    }
}
