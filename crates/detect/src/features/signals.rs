//! 공격 신호 카탈로그
//!
//! 신호 계열(명령어/셸, SQL, XSS, 인코딩 악용, 인증 우회)별 토큰 목록과
//! 정규식, 그리고 디코딩된 텍스트에서 각 신호를 세는 함수를 정의합니다.
//!
//! 부분 문자열 개수와 정규식 매치는 모두 겹치지 않는(leftmost-first) 방식으로 셉니다.

use regex::Regex;

// ─── 명령어 / 셸 ────────────────────────────────────────────────────

/// 명령어 키워드
pub const CMD_KEYWORDS: &[&str] = &[
    "ls", "cat", "wget", "curl", "chmod", "chown", "rm ", "rm -rf", "mv ", "cp ", "echo ", "id",
    "whoami", "uname", "ping", "nc ", "netcat", "bash", "sh ", "/bin/sh", "/bin/bash", "nohup",
    "python", "perl", "php ", "nc -e",
];

/// 셸 연산자
pub const CMD_SPECIALS: &[&str] = &[";", "&&", "||", "|", "`", "$(", ")", ">>", "<", "&"];

/// 셸 호출 구문
pub const SHELL_PATTERNS: &[&str] = &[
    "sh -c", "/bin/sh", "/bin/bash", "$(whoami", "$(id", "$(uname", "$(curl", "$(wget",
];

/// 경로 순회 패턴 (인코딩/이중 인코딩 변형 포함)
pub const PATH_TRAVERSAL: &[&str] = &[
    "../",
    "..\\",
    "%2e%2e%2f",
    "%2e%2e\\",
    "..%2f",
    "%252e%252e%252f",
];

/// 민감 파일 참조
pub const SENSITIVE_FILES: &[&str] = &[
    "/etc/passwd",
    "/etc/shadow",
    "/etc/hosts",
    "id_rsa",
    "id_dsa",
    "authorized_keys",
    "web.config",
    "config.php",
    "settings.py",
    ".htaccess",
    "wp-config.php",
];

// ─── SQL ────────────────────────────────────────────────────────────

/// SQL 키워드
pub const SQL_KEYWORDS: &[&str] = &[
    "select", "union", "insert", "update", "delete", "drop", "truncate", "alter", "create", "from",
    "where", "group by", "order by", "having", "limit", "offset", "into", "values", "join",
    "inner join", "outer join", "sleep", "benchmark",
];

/// SQL 주석 표식
pub const SQL_COMMENT_MARKERS: &[&str] = &["--", "/*", "*/", "#", "--+", "#+"];

/// 항상 참/거짓인 SQL 리터럴
pub const SQL_TAUTOLOGIES: &[&str] = &[
    "1=1",
    "1 = 1",
    "1=2",
    "1 = 2",
    "true",
    "false",
    "is null",
    "is not null",
    "like '%",
    "like \"%",
];

/// 퍼센트 인코딩된 SQL 메타 문자
pub const SQL_URL_SIGNS: &[&str] = &[
    "%27",
    "%22",
    "%23",
    "%20or%20",
    "%20and%20",
    "%2527",
    "%2520",
    "%255c",
    "%253d",
];

/// 유니코드 이스케이프 따옴표와 함께 나타나면 가산되는 SQL 문맥
const SQL_QUOTE_CONTEXT: &[&str] = &["select", "union", " or ", " and "];

// ─── XSS ────────────────────────────────────────────────────────────

/// 스크립트 URI 프로토콜
pub const JS_PROTOCOLS: &[&str] = &[
    "javascript:",
    "vbscript:",
    "data:text/html",
    "data:text/javascript",
];

/// 속성에 직접 들어간 스크립트 URI
pub const JS_URIS: &[&str] = &[
    "href=javascript:",
    "src=javascript:",
    "xlink:href=javascript:",
];

// ─── 인증 우회 ──────────────────────────────────────────────────────

/// 자격 증명/토큰/세션 파라미터 이름
pub const AUTH_KEYS: &[&str] = &[
    "login",
    "signin",
    "signup",
    "register",
    "username=",
    "user=",
    "userid=",
    "password=",
    "pwd=",
    "pass=",
    "passwd=",
    "token=",
    "access_token=",
    "refresh_token=",
    "jwt=",
    "authorization",
    "bearer ",
    "api_key=",
    "apikey=",
    "key=",
    "session=",
    "sessionid=",
    "sessid=",
];

/// 약한 비밀번호 리터럴 (존재 시 각 +2)
pub const WEAK_PASSWORDS: &[&str] = &["123", "1234", "12345", "123456", "password", "admin", "root"];

/// `alg: none` JWT 헤더 (존재 시 각 +3)
pub const JWT_ALG_NONE: &[&str] = &["\"alg\":\"none\"", "\"alg\": \"none\"", "'alg':'none'"];

/// 약한 OTP/PIN 값 (존재 시 각 +2)
pub const WEAK_OTPS: &[&str] = &["otp=000000", "otp=111111", "pin=0000"];

/// 인증 엔드포인트 경로 (하나라도 있으면 +1)
pub const AUTH_ENDPOINTS: &[&str] = &["/login", "/auth", "/session", "/reset", "/forgot"];

/// 토큰 목록의 겹치지 않는 부분 문자열 개수 합계
pub fn count_tokens(text: &str, tokens: &[&str]) -> usize {
    tokens.iter().map(|t| text.matches(t).count()).sum()
}

/// 목록 중 텍스트에 존재하는 토큰 수
fn count_present(text: &str, tokens: &[&str]) -> usize {
    tokens.iter().filter(|t| text.contains(*t)).count()
}

/// 특수 문자 여부 (영숫자도 공백도 아닌 문자)
pub fn is_special(ch: char) -> bool {
    !ch.is_alphanumeric() && !ch.is_whitespace()
}

/// 문자 빈도 분포에 대한 Shannon 엔트로피
pub fn entropy(text: &str) -> f64 {
    let mut counts: std::collections::HashMap<char, usize> = std::collections::HashMap::new();
    let mut total = 0usize;
    for ch in text.chars() {
        *counts.entry(ch).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// 가장 긴 연속 특수 문자 길이
pub fn longest_special_run(text: &str) -> usize {
    let mut current = 0usize;
    let mut longest = 0usize;
    for ch in text.chars() {
        if is_special(ch) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// 인증 우회 지표 점수
pub fn broken_auth_score(text: &str) -> usize {
    let mut score = count_tokens(text, AUTH_KEYS);
    score += 2 * count_present(text, WEAK_PASSWORDS);
    score += 3 * count_present(text, JWT_ALG_NONE);
    score += 2 * count_present(text, WEAK_OTPS);
    if AUTH_ENDPOINTS.iter().any(|e| text.contains(e)) {
        score += 1;
    }
    score
}

/// 컴파일된 신호 정규식 모음
///
/// 추출기 생성 시 한 번 컴파일되며 이후 읽기 전용으로 공유됩니다.
#[derive(Debug, Clone)]
pub struct SignalPatterns {
    sql_hex: Regex,
    sql_versioned_comment: Regex,
    sql_union_select: Regex,
    sql_or_true: Regex,
    sql_unicode_quote: Regex,
    sql_func: Regex,
    sql_boolean: Regex,
    sql_comment_block: Regex,
    double_escape: Regex,
    xss_tag: Regex,
    xss_event: Regex,
    xss_rare_tag: Regex,
    unicode_escape: Regex,
    base64_chunk: Regex,
}

impl SignalPatterns {
    /// 모든 신호 정규식을 컴파일합니다.
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            sql_hex: Regex::new(r"(?i)0x[0-9a-f]{4,}")?,
            sql_versioned_comment: Regex::new(r"(?i)/\*![0-9]*\s*select")?,
            sql_union_select: Regex::new(r"(?i)union(?:/\*.*?\*/|\s+)+select")?,
            sql_or_true: Regex::new(r"(?i)\bor\s*[/*)(+\s]*1\s*=\s*1")?,
            sql_unicode_quote: Regex::new(r"(?i)\\u0*0*27")?,
            sql_func: Regex::new(
                r"(?i)\b(?:ascii|char|count|sum|avg|min|max|substr|substring|md5|sha1|concat|database|schema|version|sleep|benchmark|if|pg_sleep|pg_read_file|json_extract|extractvalue|updatexml)\s*\(",
            )?,
            sql_boolean: Regex::new(
                r#"(?i)(?:\bor\b|\band\b|\bxor\b)\s+[0-9a-z_'"]+\s*=\s*[0-9a-z_'"]+"#,
            )?,
            sql_comment_block: Regex::new(r"/\*.*?\*/")?,
            double_escape: Regex::new(r"%[0-9a-f]{2}%[0-9a-f]{2}")?,
            xss_tag: Regex::new(
                r"(?i)<\s*(?:script|img|svg|math|iframe|object|embed|video|audio|details|marquee|body|input|textarea|button)\b",
            )?,
            xss_event: Regex::new(r"(?i)\bon\w+\s*=")?,
            xss_rare_tag: Regex::new(
                r"(?i)<\s*(?:svg|math|details|marquee|embed|object|video|audio)\b",
            )?,
            unicode_escape: Regex::new(r"\\u[0-9a-f]{4}")?,
            base64_chunk: Regex::new(r"[A-Za-z0-9+/]{20,}={0,2}")?,
        })
    }

    /// SQL 키워드 점수 (16진 리터럴, 버전 주석, 주석 분할 `union select` ×2 포함)
    pub fn sql_keyword_count(&self, text: &str) -> usize {
        count_tokens(text, SQL_KEYWORDS)
            + self.sql_hex.find_iter(text).count()
            + self.sql_versioned_comment.find_iter(text).count()
            + 2 * self.sql_union_select.find_iter(text).count()
    }

    /// SQL 주석 표식 수 + 완결된 `/*...*/` 블록 수
    pub fn sql_comment_count(&self, text: &str) -> usize {
        count_tokens(text, SQL_COMMENT_MARKERS) + self.sql_comment_block.find_iter(text).count()
    }

    /// `or|and|xor <피연산자> = <피연산자>` 매치 수
    pub fn sql_boolean_ops(&self, text: &str) -> usize {
        self.sql_boolean.find_iter(text).count()
    }

    /// SQL 함수 호출 매치 수
    pub fn sql_func_count(&self, text: &str) -> usize {
        self.sql_func.find_iter(text).count()
    }

    /// 복합 SQL 논리 패턴 점수
    pub fn sql_logic_count(&self, text: &str) -> usize {
        let mut score = count_tokens(text, SQL_TAUTOLOGIES);
        score += count_tokens(text, SQL_URL_SIGNS);

        if self.double_escape.is_match(text) {
            score += 2;
        }

        score += 2 * self.sql_union_select.find_iter(text).count();
        score += 2 * self.sql_or_true.find_iter(text).count();

        if self.sql_unicode_quote.is_match(text)
            && SQL_QUOTE_CONTEXT.iter().any(|k| text.contains(k))
        {
            score += 2;
        }

        score
    }

    /// 위험 태그 매치 수
    pub fn xss_tag_count(&self, text: &str) -> usize {
        self.xss_tag.find_iter(text).count()
    }

    /// 이벤트 핸들러 속성 매치 수
    pub fn xss_event_count(&self, text: &str) -> usize {
        self.xss_event.find_iter(text).count()
    }

    /// 희귀 태그 매치 수
    pub fn xss_rare_tag_count(&self, text: &str) -> usize {
        self.xss_rare_tag.find_iter(text).count()
    }

    /// `\uXXXX` 이스케이프 수
    pub fn unicode_escape_count(&self, text: &str) -> usize {
        self.unicode_escape.find_iter(text).count()
    }

    /// base64 형태 청크 수 (20자 이상)
    pub fn base64_chunk_count(&self, text: &str) -> usize {
        self.base64_chunk.find_iter(text).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> SignalPatterns {
        SignalPatterns::compile().expect("signal patterns compile")
    }

    #[test]
    fn entropy_of_empty_and_uniform_text() {
        assert_eq!(entropy(""), 0.0);
        assert_eq!(entropy("aaaa"), 0.0);
        assert!((entropy("ab") - 1.0).abs() < 1e-12);
        assert!((entropy("abcd") - 2.0).abs() < 1e-12);
    }

    #[test]
    fn special_chars_exclude_alnum_and_space() {
        assert!(is_special('\''));
        assert!(is_special('<'));
        assert!(!is_special('a'));
        assert!(!is_special('7'));
        assert!(!is_special(' '));
        assert!(!is_special('한'));
    }

    #[test]
    fn longest_run_resets_on_normal_char() {
        assert_eq!(longest_special_run(""), 0);
        assert_eq!(longest_special_run("abc"), 0);
        assert_eq!(longest_special_run("a'--b;"), 3);
        assert_eq!(longest_special_run("<<>> x ))"), 4);
    }

    #[test]
    fn token_counts_are_non_overlapping() {
        assert_eq!(count_tokens("aaaa", &["aa"]), 2);
        assert_eq!(count_tokens("; ls; ls", &[";", "ls"]), 4);
    }

    #[test]
    fn cmd_keywords_count_substrings() {
        let text = "; cat /etc/passwd";
        assert_eq!(count_tokens(text, CMD_KEYWORDS), 1);
        assert_eq!(count_tokens(text, SENSITIVE_FILES), 1);
        assert_eq!(count_tokens(text, CMD_SPECIALS), 1);
    }

    #[test]
    fn shell_and_traversal_patterns() {
        assert_eq!(count_tokens("x=$(whoami)", SHELL_PATTERNS), 1);
        assert_eq!(count_tokens("../../etc", PATH_TRAVERSAL), 2);
        assert_eq!(count_tokens("%252e%252e%252f", PATH_TRAVERSAL), 1);
    }

    #[test]
    fn sql_keywords_with_union_obfuscation() {
        let p = patterns();
        // select, union + union/**/select ×2
        assert_eq!(p.sql_keyword_count("union/**/select"), 4);
        assert_eq!(p.sql_keyword_count("0xdeadbeef"), 1);
        assert_eq!(p.sql_keyword_count("/*!50000select"), 2);
        assert_eq!(p.sql_keyword_count("hello world"), 0);
    }

    #[test]
    fn sql_comments_count_markers_and_blocks() {
        let p = patterns();
        // "/*", "*/" + one complete block
        assert_eq!(p.sql_comment_count("a/*x*/b"), 3);
        // "--", "--+"
        assert_eq!(p.sql_comment_count("1' --+"), 2);
        assert_eq!(p.sql_comment_count("#"), 1);
    }

    #[test]
    fn sql_boolean_ops_match_comparisons() {
        let p = patterns();
        assert_eq!(p.sql_boolean_ops("' or 1=1"), 1);
        assert_eq!(p.sql_boolean_ops("x and 'a'='a'"), 1);
        assert_eq!(p.sql_boolean_ops("order=1"), 0);
    }

    #[test]
    fn sql_functions_require_call_syntax() {
        let p = patterns();
        assert_eq!(p.sql_func_count("sleep(5)"), 1);
        assert_eq!(p.sql_func_count("ascii (substring(x,1,1))"), 2);
        assert_eq!(p.sql_func_count("sleeping"), 0);
    }

    #[test]
    fn sql_logic_combines_sources() {
        let p = patterns();
        // "1=1" + or-true ×2
        assert_eq!(p.sql_logic_count("' or 1=1"), 3);
        // "%27" + double escape +2
        assert_eq!(p.sql_logic_count("%27%20"), 3);
        assert_eq!(p.sql_logic_count("plain text"), 0);
    }

    #[test]
    fn sql_logic_unicode_quote_needs_context() {
        let p = patterns();
        assert_eq!(p.sql_logic_count("\\u0027"), 0);
        assert_eq!(p.sql_logic_count("\\u0027 union"), 2);
    }

    #[test]
    fn xss_patterns() {
        let p = patterns();
        let text = "<svg onload=alert(1)><script>";
        assert_eq!(p.xss_tag_count(text), 2);
        assert_eq!(p.xss_rare_tag_count(text), 1);
        assert_eq!(p.xss_event_count(text), 1);
        assert_eq!(count_tokens("<a href=javascript:x>", JS_PROTOCOLS), 1);
        assert_eq!(count_tokens("<a href=javascript:x>", JS_URIS), 1);
    }

    #[test]
    fn encoding_abuse_patterns() {
        let p = patterns();
        assert_eq!(p.unicode_escape_count("\\u003c\\u003e"), 2);
        assert_eq!(p.base64_chunk_count("dGhpcyBpcyBhIHRlc3Qgc3RyaW5n=="), 1);
        assert_eq!(p.base64_chunk_count("short"), 0);
    }

    #[test]
    fn broken_auth_score_components() {
        assert_eq!(broken_auth_score(""), 0);
        // login, user=, pass= 키 + 약한 비밀번호 admin +2 + 엔드포인트 +1
        assert_eq!(broken_auth_score("/login user=admin pass=x"), 6);
        assert_eq!(broken_auth_score("{\"alg\":\"none\"}"), 3);
        assert_eq!(broken_auth_score("otp=000000"), 2);
    }
}
