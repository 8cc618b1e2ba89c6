//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 정규화된 요청 레코드, 공격 카테고리, 분류 결과, 심각도 등급,
//! 그리고 최종 알림 레코드를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 정규화된 요청 레코드
///
/// 스키마가 제각각인 원본 로그를 정규화한 결과입니다.
/// 모든 필드는 항상 문자열이며 비어 있을 수는 있지만 누락되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// 이벤트 시각 (ISO-8601)
    pub time: String,
    /// 클라이언트 IP
    pub ip: String,
    /// HTTP 메서드
    pub method: String,
    /// 요청 URL (경로 + 쿼리)
    pub url: String,
    /// 요청 본문
    pub body: String,
}

impl fmt::Display for NormalizedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.time, self.ip, self.method, self.url)
    }
}

/// 공격 카테고리
///
/// 닫힌 집합입니다. 직렬화 레이블은 저장 파일과 분류기 레이블 맵에서
/// 그대로 사용됩니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    /// 정상 요청
    #[default]
    #[serde(rename = "Benign")]
    Benign,
    /// SQL 인젝션
    #[serde(rename = "SQL Injection")]
    SqlInjection,
    /// 크로스 사이트 스크립팅
    #[serde(rename = "XSS")]
    Xss,
    /// 명령어 인젝션
    #[serde(rename = "Command Injection")]
    CommandInjection,
    /// 인증 우회 / 취약한 인증
    #[serde(rename = "Broken Authentication")]
    BrokenAuthentication,
}

impl Category {
    /// 모든 카테고리 (외부 인덱스 순서)
    pub const ALL: [Category; 5] = [
        Self::Benign,
        Self::SqlInjection,
        Self::Xss,
        Self::CommandInjection,
        Self::BrokenAuthentication,
    ];

    /// 직렬화 레이블
    pub fn label(self) -> &'static str {
        match self {
            Self::Benign => "Benign",
            Self::SqlInjection => "SQL Injection",
            Self::Xss => "XSS",
            Self::CommandInjection => "Command Injection",
            Self::BrokenAuthentication => "Broken Authentication",
        }
    }

    /// 외부 카테고리 인덱스 (4, 5는 사용하지 않음)
    pub fn index(self) -> usize {
        match self {
            Self::Benign => 0,
            Self::SqlInjection => 1,
            Self::Xss => 2,
            Self::CommandInjection => 3,
            Self::BrokenAuthentication => 6,
        }
    }

    /// 외부 카테고리 인덱스에서 카테고리를 찾습니다.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.index() == index)
    }

    /// 파일 이름 등에 쓰는 짧은 식별자
    pub fn slug(self) -> &'static str {
        match self {
            Self::Benign => "benign",
            Self::SqlInjection => "sqli",
            Self::Xss => "xss",
            Self::CommandInjection => "cmdi",
            Self::BrokenAuthentication => "broken_auth",
        }
    }

    /// 문자열에서 카테고리를 파싱합니다.
    ///
    /// 대소문자, 공백, 밑줄, 하이픈을 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "benign" | "normal" => Some(Self::Benign),
            "sqlinjection" | "sqli" | "sql" => Some(Self::SqlInjection),
            "xss" | "crosssitescripting" => Some(Self::Xss),
            "commandinjection" | "cmdi" | "cmd" | "command" => Some(Self::CommandInjection),
            "brokenauthentication" | "brokenauth" | "auth" => Some(Self::BrokenAuthentication),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 분류 결과
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// 예측된 카테고리
    pub category: Category,
    /// 신뢰도 (0~100)
    pub confidence: f64,
}

/// 심각도 등급
///
/// 심각도 점수(0~100)의 순수 함수입니다.
/// `Ord` 구현으로 등급 비교가 가능합니다 (`Safe < Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityTier {
    /// 위험 없음
    #[default]
    Safe,
    /// 낮음
    Low,
    /// 중간
    Medium,
    /// 높음
    High,
    /// 치명적, 즉시 대응 필요
    Critical,
}

impl SeverityTier {
    /// 점수에서 등급을 계산합니다.
    ///
    /// 임계값은 포함 하한이며 위에서부터 평가합니다.
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::Critical,
            70..=89 => Self::High,
            40..=69 => Self::Medium,
            10..=39 => Self::Low,
            _ => Self::Safe,
        }
    }

    /// 문자열에서 등급을 파싱합니다 (대소문자 무시).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "safe" => Some(Self::Safe),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// 보안 알림 레코드
///
/// 정규화 레코드, 분류 결과, 심각도를 평탄하게 합친 형태입니다.
/// 이벤트마다 생성되어 브로드캐스트 또는 저장 후 버려집니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub time: String,
    pub ip: String,
    pub method: String,
    pub url: String,
    pub body: String,
    /// 예측된 공격 카테고리
    pub attack: Category,
    /// 분류 신뢰도 (0~100)
    pub confidence: f64,
    /// 심각도 점수 (0~100)
    pub severity: u8,
    /// 심각도 등급
    pub level: SeverityTier,
}

impl AlertRecord {
    /// 정규화 레코드와 분류/채점 결과를 합칩니다.
    pub fn new(
        record: NormalizedRecord,
        classification: ClassificationResult,
        severity: u8,
        level: SeverityTier,
    ) -> Self {
        Self {
            time: record.time,
            ip: record.ip,
            method: record.method,
            url: record.url,
            body: record.body,
            attack: classification.category,
            confidence: classification.confidence,
            severity,
            level,
        }
    }
}

impl fmt::Display for AlertRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({:.2}%) severity={} {} {}",
            self.level, self.attack, self.confidence, self.severity, self.ip, self.url,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        let cases = [
            (100, SeverityTier::Critical),
            (90, SeverityTier::Critical),
            (89, SeverityTier::High),
            (70, SeverityTier::High),
            (69, SeverityTier::Medium),
            (40, SeverityTier::Medium),
            (39, SeverityTier::Low),
            (10, SeverityTier::Low),
            (9, SeverityTier::Safe),
            (0, SeverityTier::Safe),
        ];
        for (score, expected) in cases {
            assert_eq!(SeverityTier::from_score(score), expected, "score {score}");
        }
    }

    #[test]
    fn tier_ordering() {
        assert!(SeverityTier::Safe < SeverityTier::Low);
        assert!(SeverityTier::Low < SeverityTier::Medium);
        assert!(SeverityTier::Medium < SeverityTier::High);
        assert!(SeverityTier::High < SeverityTier::Critical);
    }

    #[test]
    fn tier_serializes_uppercase() {
        let json = serde_json::to_string(&SeverityTier::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
        assert_eq!(SeverityTier::Medium.to_string(), "MEDIUM");
    }

    #[test]
    fn category_serializes_with_wire_labels() {
        let json = serde_json::to_string(&Category::SqlInjection).unwrap();
        assert_eq!(json, "\"SQL Injection\"");
        let parsed: Category = serde_json::from_str("\"Broken Authentication\"").unwrap();
        assert_eq!(parsed, Category::BrokenAuthentication);
    }

    #[test]
    fn category_index_has_gap_at_four() {
        assert_eq!(Category::BrokenAuthentication.index(), 6);
        assert_eq!(Category::from_index(6), Some(Category::BrokenAuthentication));
        assert_eq!(Category::from_index(4), None);
        assert_eq!(Category::from_index(5), None);
        assert_eq!(Category::from_index(3), Some(Category::CommandInjection));
    }

    #[test]
    fn category_from_str_loose() {
        assert_eq!(
            Category::from_str_loose("sql injection"),
            Some(Category::SqlInjection)
        );
        assert_eq!(
            Category::from_str_loose("Broken_Auth"),
            Some(Category::BrokenAuthentication)
        );
        assert_eq!(
            Category::from_str_loose("command-injection"),
            Some(Category::CommandInjection)
        );
        assert_eq!(Category::from_str_loose("XSS"), Some(Category::Xss));
        assert_eq!(Category::from_str_loose("ddos"), None);
    }

    #[test]
    fn category_label_matches_serde() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.label()));
        }
    }

    #[test]
    fn alert_record_serializes_flat() {
        let record = NormalizedRecord {
            time: "2024-01-15T12:00:00".to_owned(),
            ip: "10.0.0.5".to_owned(),
            method: "POST".to_owned(),
            url: "/login".to_owned(),
            body: "user=admin".to_owned(),
        };
        let alert = AlertRecord::new(
            record,
            ClassificationResult {
                category: Category::BrokenAuthentication,
                confidence: 77.5,
            },
            70,
            SeverityTier::High,
        );

        let value = serde_json::to_value(&alert).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys.len(), 9);
        assert_eq!(value["attack"], "Broken Authentication");
        assert_eq!(value["level"], "HIGH");
        assert_eq!(value["severity"], 70);
        assert_eq!(value["ip"], "10.0.0.5");
    }

    #[test]
    fn alert_record_display() {
        let alert = AlertRecord::new(
            NormalizedRecord {
                url: "/search?q=<script>".to_owned(),
                ip: "1.2.3.4".to_owned(),
                ..Default::default()
            },
            ClassificationResult {
                category: Category::Xss,
                confidence: 88.123,
            },
            55,
            SeverityTier::Medium,
        );
        let display = alert.to_string();
        assert!(display.contains("MEDIUM"));
        assert!(display.contains("XSS"));
        assert!(display.contains("88.12%"));
    }
}
