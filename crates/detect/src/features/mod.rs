//! 특징 추출 -- 디코딩된 요청 텍스트에서 공격 신호를 수치화
//!
//! [`FeatureExtractor`]는 신호 정규식을 생성 시 한 번 컴파일하고,
//! 이후 [`extract`](FeatureExtractor::extract)는 잠금 없이 여러 태스크에서 호출할 수 있습니다.
//!
//! # 사용 예시
//! ```ignore
//! use webwatch_detect::features::{FeatureExtractor, decode_request};
//!
//! let extractor = FeatureExtractor::new()?;
//! let decoded = decode_request("/search?q=%3Cscript%3E", "");
//! let features = extractor.extract(&decoded);
//! assert_eq!(features.xss_tag_count, 1);
//! ```

pub mod decode;
pub mod signals;

pub use decode::{decode, decode_request};

use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use signals::SignalPatterns;

/// 분류기 기본 특징 열 순서
///
/// 모델 번들이 열 순서를 지정하지 않으면 이 순서를 사용합니다.
/// `broken_auth_count`는 관찰용 신호이므로 포함되지 않습니다.
pub const DEFAULT_META_COLS: [&str; 22] = [
    "url_length",
    "entropy",
    "num_special",
    "special_ratio",
    "longest_special_seq",
    "cmd_keyword_count",
    "sql_comment_count",
    "cmd_special_count",
    "sql_keyword_count",
    "sql_boolean_ops",
    "sql_func_count",
    "xss_tag_count",
    "xss_event_count",
    "js_proto_count",
    "path_traversal_count",
    "sensitive_file_count",
    "shell_pattern_count",
    "xss_js_uri_count",
    "xss_rare_tag_count",
    "unicode_escape_count",
    "base64_chunk_count",
    "sql_logic_count",
];

/// 특징 벡터
///
/// 키 집합은 고정이며 빈 입력에 대해서는 모든 값이 0입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub url_length: usize,
    pub entropy: f64,
    pub num_special: usize,
    pub special_ratio: f64,
    pub longest_special_seq: usize,
    pub cmd_keyword_count: usize,
    pub sql_comment_count: usize,
    pub cmd_special_count: usize,
    pub sql_keyword_count: usize,
    pub sql_boolean_ops: usize,
    pub sql_func_count: usize,
    pub xss_tag_count: usize,
    pub xss_event_count: usize,
    pub js_proto_count: usize,
    pub path_traversal_count: usize,
    pub sensitive_file_count: usize,
    pub shell_pattern_count: usize,
    pub xss_js_uri_count: usize,
    pub xss_rare_tag_count: usize,
    pub unicode_escape_count: usize,
    pub base64_chunk_count: usize,
    pub sql_logic_count: usize,
    /// 인증 우회 지표 (관찰용, 점수화되지 않음)
    pub broken_auth_count: usize,
}

impl FeatureVector {
    /// 열 이름으로 신호 값을 조회합니다.
    ///
    /// 알 수 없는 이름이면 `None`을 반환합니다.
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "url_length" => self.url_length as f64,
            "entropy" => self.entropy,
            "num_special" => self.num_special as f64,
            "special_ratio" => self.special_ratio,
            "longest_special_seq" => self.longest_special_seq as f64,
            "cmd_keyword_count" => self.cmd_keyword_count as f64,
            "sql_comment_count" => self.sql_comment_count as f64,
            "cmd_special_count" => self.cmd_special_count as f64,
            "sql_keyword_count" => self.sql_keyword_count as f64,
            "sql_boolean_ops" => self.sql_boolean_ops as f64,
            "sql_func_count" => self.sql_func_count as f64,
            "xss_tag_count" => self.xss_tag_count as f64,
            "xss_event_count" => self.xss_event_count as f64,
            "js_proto_count" => self.js_proto_count as f64,
            "path_traversal_count" => self.path_traversal_count as f64,
            "sensitive_file_count" => self.sensitive_file_count as f64,
            "shell_pattern_count" => self.shell_pattern_count as f64,
            "xss_js_uri_count" => self.xss_js_uri_count as f64,
            "xss_rare_tag_count" => self.xss_rare_tag_count as f64,
            "unicode_escape_count" => self.unicode_escape_count as f64,
            "base64_chunk_count" => self.base64_chunk_count as f64,
            "sql_logic_count" => self.sql_logic_count as f64,
            "broken_auth_count" => self.broken_auth_count as f64,
            _ => return None,
        };
        Some(value)
    }

    /// 기본 분류기 열 순서대로 `(이름, 값)` 쌍을 반환합니다.
    pub fn as_pairs(&self) -> Vec<(&'static str, f64)> {
        DEFAULT_META_COLS
            .iter()
            .map(|&name| (name, self.get(name).unwrap_or(0.0)))
            .collect()
    }
}

/// 특징 추출기
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    patterns: SignalPatterns,
}

impl FeatureExtractor {
    /// 신호 정규식을 컴파일하여 추출기를 생성합니다.
    pub fn new() -> Result<Self, DetectError> {
        Ok(Self {
            patterns: SignalPatterns::compile()?,
        })
    }

    /// 디코딩된 텍스트에서 특징 벡터를 계산합니다.
    ///
    /// 결정적 전함수이며 빈 입력에 대해 모든 값이 0인 벡터를 반환합니다.
    pub fn extract(&self, decoded: &str) -> FeatureVector {
        if decoded.is_empty() {
            return FeatureVector::default();
        }

        let p = &self.patterns;
        let char_len = decoded.chars().count();
        let num_special = decoded.chars().filter(|&c| signals::is_special(c)).count();
        // 디코딩 결과는 이미 소문자지만, 직접 호출되는 경우를 위해 다시 맞춥니다
        let lower = decoded.to_lowercase();
        let text = lower.as_str();

        FeatureVector {
            url_length: char_len,
            entropy: signals::entropy(decoded),
            num_special,
            special_ratio: num_special as f64 / (char_len as f64 + 1.0),
            longest_special_seq: signals::longest_special_run(decoded),
            cmd_keyword_count: signals::count_tokens(text, signals::CMD_KEYWORDS),
            sql_comment_count: p.sql_comment_count(text),
            cmd_special_count: signals::count_tokens(text, signals::CMD_SPECIALS),
            sql_keyword_count: p.sql_keyword_count(text),
            sql_boolean_ops: p.sql_boolean_ops(text),
            sql_func_count: p.sql_func_count(decoded),
            xss_tag_count: p.xss_tag_count(decoded),
            xss_event_count: p.xss_event_count(decoded),
            js_proto_count: signals::count_tokens(text, signals::JS_PROTOCOLS),
            path_traversal_count: signals::count_tokens(text, signals::PATH_TRAVERSAL),
            sensitive_file_count: signals::count_tokens(text, signals::SENSITIVE_FILES),
            shell_pattern_count: signals::count_tokens(text, signals::SHELL_PATTERNS),
            xss_js_uri_count: signals::count_tokens(text, signals::JS_URIS),
            xss_rare_tag_count: p.xss_rare_tag_count(decoded),
            unicode_escape_count: p.unicode_escape_count(decoded),
            base64_chunk_count: p.base64_chunk_count(decoded),
            sql_logic_count: p.sql_logic_count(text),
            broken_auth_count: signals::broken_auth_score(text),
        }
    }

    /// URL과 본문을 디코딩한 뒤 특징을 추출합니다.
    ///
    /// 분류기에 넘길 디코딩 텍스트와 특징 벡터를 함께 반환합니다.
    pub fn decode_and_extract(&self, url: &str, body: &str) -> (String, FeatureVector) {
        let decoded = decode_request(url, body);
        let features = self.extract(&decoded);
        (decoded, features)
    }
}
