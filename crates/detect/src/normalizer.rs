//! 로그 정규화 -- 스키마가 제각각인 원시 이벤트를 표준 레코드로 변환
//!
//! [`LogNormalizer`]는 필드마다 후보 키 목록을 왼쪽부터 확인하여
//! 처음으로 "존재하는" 값을 사용합니다. 어떤 입력에도 실패하지 않습니다.
//!
//! # 존재 판정
//! 키가 있고 값이 비어 있지 않아야 존재로 봅니다.
//! `null`, `""`, `0`, `0.0`, `false`, 빈 배열, 빈 객체는 없는 것으로 취급합니다.

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use webwatch_core::types::NormalizedRecord;

use crate::error::DetectError;

/// 시간 후보 키
pub const TIME_KEYS: &[&str] = &["time", "timestamp", "ts"];

/// IP 후보 키
pub const IP_KEYS: &[&str] = &[
    "ip",
    "remote_ip",
    "client_ip",
    "source_ip",
    "host",
    "ip_address",
    "src_ip",
];

/// `headers` 안에서 확인하는 IP 헤더 (대소문자 무시)
pub const IP_HEADER_KEYS: &[&str] = &["x-forwarded-for", "x-real-ip"];

/// 메서드 후보 키
pub const METHOD_KEYS: &[&str] = &["method", "http_method"];

/// URL 후보 키
pub const URL_KEYS: &[&str] = &["url", "path"];

/// 본문 후보 키
pub const BODY_KEYS: &[&str] = &["body", "data"];

/// IP를 찾지 못했을 때의 값
pub const FALLBACK_IP: &str = "0.0.0.0";

/// 메서드 기본값
pub const DEFAULT_METHOD: &str = "GET";

/// 초 단위까지의 시간 형식 (UTC, 오프셋 없음)
const ISO_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 로그 정규화기
///
/// IPv4 폴백 정규식을 생성 시 한 번 컴파일합니다.
#[derive(Debug, Clone)]
pub struct LogNormalizer {
    ipv4: Regex,
}

impl LogNormalizer {
    /// 새 정규화기를 생성합니다.
    pub fn new() -> Result<Self, DetectError> {
        Ok(Self {
            ipv4: Regex::new(r"\b[0-9]{1,3}(?:\.[0-9]{1,3}){3}\b")?,
        })
    }

    /// 원시 이벤트를 정규화합니다.
    ///
    /// 객체가 아닌 입력(배열, 스칼라)은 빈 객체로 취급합니다.
    pub fn normalize(&self, raw: &Value) -> NormalizedRecord {
        let empty = Map::new();
        let obj = raw.as_object().unwrap_or(&empty);

        let time = match first_present(obj, TIME_KEYS) {
            Some(Value::Number(n)) => epoch_to_iso(n).unwrap_or_else(|| n.to_string()),
            Some(value) => coerce(value),
            None => now_iso(),
        };

        let ip = first_present(obj, IP_KEYS)
            .map(coerce)
            .or_else(|| header_ip(obj))
            .unwrap_or_else(|| self.scan_ipv4(obj));

        let method = first_present(obj, METHOD_KEYS)
            .map(coerce)
            .unwrap_or_else(|| DEFAULT_METHOD.to_owned());
        let url = first_present(obj, URL_KEYS).map(coerce).unwrap_or_default();
        let body = first_present(obj, BODY_KEYS).map(coerce).unwrap_or_default();

        NormalizedRecord {
            time,
            ip,
            method,
            url,
            body,
        }
    }

    /// 이벤트 전체를 직렬화하여 처음 나오는 IPv4 형태 문자열을 찾습니다.
    fn scan_ipv4(&self, obj: &Map<String, Value>) -> String {
        let serialized = serde_json::to_string(obj).unwrap_or_default();
        self.ipv4
            .find(&serialized)
            .map(|m| m.as_str().to_owned())
            .unwrap_or_else(|| FALLBACK_IP.to_owned())
    }
}

/// 값이 비어 있지 않은지 판정합니다.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// 후보 키 중 처음으로 존재하는 값을 찾습니다.
fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| is_present(value))
}

/// `headers` 객체에서 프록시 IP 헤더를 찾습니다.
///
/// 헤더 이름은 대소문자를 무시하고, 배열 값은 첫 요소를 사용합니다.
/// 여러 홉이 나열된 값은 나누지 않고 그대로 유지합니다.
fn header_ip(obj: &Map<String, Value>) -> Option<String> {
    let headers = obj.get("headers")?.as_object()?;

    IP_HEADER_KEYS.iter().find_map(|wanted| {
        headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .and_then(|(_, value)| match value {
                Value::Array(items) => items.first(),
                other => Some(other),
            })
            .filter(|value| is_present(value))
            .map(coerce)
    })
}

/// 값을 문자열로 변환합니다.
///
/// 문자열은 그대로, 숫자는 JSON 표기, 불리언은 `true`/`false`,
/// 배열과 객체는 압축 JSON으로 변환합니다.
pub fn coerce(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// epoch 초를 ISO-8601 형식으로 변환합니다.
///
/// 표현할 수 없는 값(범위 밖, NaN)이면 `None`을 반환합니다.
fn epoch_to_iso(n: &serde_json::Number) -> Option<String> {
    let dt = if let Some(secs) = n.as_i64() {
        DateTime::from_timestamp(secs, 0)?
    } else {
        let value = n.as_f64()?;
        if !value.is_finite() {
            return None;
        }
        let mut secs = value.floor();
        let mut micros = ((value - secs) * 1_000_000.0).round();
        if micros >= 1_000_000.0 {
            secs += 1.0;
            micros = 0.0;
        }
        if secs.abs() > i64::MAX as f64 / 2.0 {
            return None;
        }
        DateTime::from_timestamp(secs as i64, (micros as u32) * 1_000)?
    };

    // 연도 1~9999만 ISO-8601 네 자리 연도로 표기할 수 있음
    if !(1..=9999).contains(&dt.year()) {
        return None;
    }
    Some(format_naive(&dt))
}

/// 현재 UTC 시각
fn now_iso() -> String {
    format_naive(&Utc::now())
}

/// 오프셋 없는 ISO 형식, 소수 초는 0이 아닐 때만 마이크로초로 붙입니다.
fn format_naive(dt: &DateTime<Utc>) -> String {
    let base = dt.format(ISO_SECONDS_FORMAT).to_string();
    match dt.timestamp_subsec_micros() {
        0 => base,
        micros => format!("{}.{:06}", base, micros),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> LogNormalizer {
        LogNormalizer::new().expect("normalizer builds")
    }

    #[test]
    fn empty_event_uses_defaults() {
        // Given: 아무 필드도 없는 이벤트
        let record = normalizer().normalize(&json!({}));

        // Then: 기본값이 채워짐
        assert_eq!(record.ip, "0.0.0.0");
        assert_eq!(record.method, "GET");
        assert_eq!(record.url, "");
        assert_eq!(record.body, "");
        assert!(!record.time.is_empty());
        assert!(record.time.contains('T'));
    }

    #[test]
    fn non_object_event_is_treated_as_empty() {
        let n = normalizer();
        for raw in [json!(null), json!([1, 2]), json!("10.0.0.1"), json!(42)] {
            let record = n.normalize(&raw);
            assert_eq!(record.ip, "0.0.0.0");
            assert_eq!(record.method, "GET");
        }
    }

    #[test]
    fn first_present_key_wins() {
        let record = normalizer().normalize(&json!({
            "ip": "",
            "remote_ip": null,
            "client_ip": "192.168.0.7",
            "src_ip": "10.9.9.9",
            "method": "POST",
            "path": "/api",
            "data": "a=1",
        }));
        assert_eq!(record.ip, "192.168.0.7");
        assert_eq!(record.method, "POST");
        assert_eq!(record.url, "/api");
        assert_eq!(record.body, "a=1");
    }

    #[test]
    fn falsy_values_are_skipped() {
        let record = normalizer().normalize(&json!({
            "url": "",
            "path": "/fallback",
            "body": 0,
            "data": false,
        }));
        assert_eq!(record.url, "/fallback");
        assert_eq!(record.body, "");
    }

    #[test]
    fn ip_from_forwarded_header() {
        let record = normalizer().normalize(&json!({"headers": {"x-forwarded-for": "10.0.0.5"}}));
        assert_eq!(record.ip, "10.0.0.5");
    }

    #[test]
    fn header_lookup_ignores_case_and_uses_first_array_item() {
        let n = normalizer();
        let record = n.normalize(&json!({"headers": {"X-Real-IP": "172.16.0.3"}}));
        assert_eq!(record.ip, "172.16.0.3");

        let record = n.normalize(&json!({"headers": {"X-Forwarded-For": ["1.2.3.4", "5.6.7.8"]}}));
        assert_eq!(record.ip, "1.2.3.4");
    }

    #[test]
    fn forwarded_header_keeps_all_hops() {
        let record = normalizer().normalize(&json!({
            "headers": {"x-forwarded-for": "203.0.113.9, 10.0.0.1"}
        }));
        assert_eq!(record.ip, "203.0.113.9, 10.0.0.1");
    }

    #[test]
    fn forwarded_header_preferred_over_real_ip() {
        let record = normalizer().normalize(&json!({
            "headers": {"x-real-ip": "2.2.2.2", "x-forwarded-for": "1.1.1.1"}
        }));
        assert_eq!(record.ip, "1.1.1.1");
    }

    #[test]
    fn ip_scanned_from_whole_event() {
        let record = normalizer().normalize(&json!({
            "meta": {"peer": "client 198.51.100.23 connected"},
            "url": "/"
        }));
        assert_eq!(record.ip, "198.51.100.23");
    }

    #[test]
    fn non_object_headers_are_ignored() {
        let record = normalizer().normalize(&json!({"headers": "x-forwarded-for: 1.1.1.1"}));
        // 문자열 전체 스캔으로는 찾음
        assert_eq!(record.ip, "1.1.1.1");

        let record = normalizer().normalize(&json!({"headers": ["x"]}));
        assert_eq!(record.ip, "0.0.0.0");
    }

    #[test]
    fn integer_epoch_converts_to_iso() {
        let record = normalizer().normalize(&json!({"ts": 1_700_000_000}));
        assert_eq!(record.time, "2023-11-14T22:13:20");
    }

    #[test]
    fn fractional_epoch_keeps_microseconds() {
        let record = normalizer().normalize(&json!({"timestamp": 1_700_000_000.25}));
        assert_eq!(record.time, "2023-11-14T22:13:20.250000");
    }

    #[test]
    fn out_of_range_epoch_falls_back_to_number_text() {
        let huge = json!(1e20);
        let record = normalizer().normalize(&json!({"time": huge}));
        assert_eq!(record.time, huge.to_string());

        let record = normalizer().normalize(&json!({"time": 99_999_999_999_999i64}));
        assert_eq!(record.time, "99999999999999");
    }

    #[test]
    fn string_time_is_kept() {
        let record = normalizer().normalize(&json!({"time": "2024-01-01 10:00:00"}));
        assert_eq!(record.time, "2024-01-01 10:00:00");
    }

    #[test]
    fn values_are_coerced_to_strings() {
        let record = normalizer().normalize(&json!({
            "ip": 12345,
            "method": true,
            "url": ["a", 1],
            "body": {"k": "v"},
        }));
        assert_eq!(record.ip, "12345");
        assert_eq!(record.method, "true");
        assert_eq!(record.url, r#"["a",1]"#);
        assert_eq!(record.body, r#"{"k":"v"}"#);
    }

    #[test]
    fn presence_rules() {
        assert!(!is_present(&json!(null)));
        assert!(!is_present(&json!("")));
        assert!(!is_present(&json!(0)));
        assert!(!is_present(&json!(0.0)));
        assert!(!is_present(&json!(false)));
        assert!(!is_present(&json!([])));
        assert!(!is_present(&json!({})));
        assert!(is_present(&json!("x")));
        assert!(is_present(&json!(-1)));
        assert!(is_present(&json!(true)));
        assert!(is_present(&json!([0])));
    }
}
