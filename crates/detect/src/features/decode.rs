//! 요청 텍스트 디코딩
//!
//! 인코딩으로 숨긴 페이로드가 드러나도록 텍스트를 정규화합니다.
//! 퍼센트 디코딩(최대 [`MAX_DECODE_ROUNDS`]회) → HTML 엔티티 디코딩 →
//! 소문자화 → 공백 정리 순서로 처리합니다.
//!
//! 엔티티 디코딩은 HTML5 규칙을 따르므로 `&#60script&#62`, `&ltscript&gt`처럼
//! 세미콜론이 빠진 엔티티도 풀립니다.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// 퍼센트 디코딩 최대 반복 횟수
///
/// 무한히 디코딩되도록 조작된 입력에 대한 작업량 상한입니다.
pub const MAX_DECODE_ROUNDS: usize = 3;

/// 요청 텍스트를 디코딩합니다.
///
/// 전함수이며 어떤 입력에도 실패하지 않습니다.
pub fn decode(text: &str) -> String {
    let mut current = text.to_owned();

    for _ in 0..MAX_DECODE_ROUNDS {
        let next = decode_round(&current);
        if next == current {
            break;
        }
        current = next;
    }

    let unescaped = htmlize::unescape(current.as_str());
    let lowered = unescaped.to_lowercase();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// URL 텍스트와 본문을 하나의 분석 텍스트로 합쳐 디코딩합니다.
pub fn decode_request(url: &str, body: &str) -> String {
    decode(&format!("{} {}", url, body))
}

/// 폼 인코딩 규칙으로 한 번 디코딩합니다 (`+` → 공백, `%XX` → 바이트).
///
/// 잘못된 이스케이프는 그대로 두고, 잘못된 UTF-8은 대체 문자로 바꿉니다.
fn decode_round(s: &str) -> String {
    let plus_decoded: Cow<'_, str> = if s.contains('+') {
        Cow::Owned(s.replace('+', " "))
    } else {
        Cow::Borrowed(s)
    };
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}
