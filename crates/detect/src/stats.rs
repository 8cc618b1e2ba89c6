//! 통계 조회 -- 저장된 줄 단위 결과 파일의 요약과 최근 이벤트
//!
//! 결과 파일은 다른 프로세스가 통째로 교체할 수 있으므로 조회할 때마다 새로 읽습니다.
//! 카테고리 집계는 열린 집합입니다. 파일에 있는 `attack` 값을 그대로 키로 씁니다.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::DetectConfig;
use crate::error::DetectError;

/// `attack` 값이 없거나 비어 있는 행의 집계 키
pub const UNKNOWN_ATTACK: &str = "Unknown";

/// 통계 요약
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// 대상 파일 경로
    pub file: String,
    /// 읽은 레코드 수
    pub total: usize,
    /// 카테고리별 레코드 수
    pub counts: BTreeMap<String, usize>,
    /// 요약 시각 (ISO-8601 UTC, `Z` 접미사)
    pub updated_at: String,
}

/// 최근 이벤트 한 행
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub time: String,
    pub ip: String,
    pub attack: String,
    pub severity: Option<u64>,
    pub level: String,
    pub confidence: Option<f64>,
    pub url: String,
}

/// 줄 단위 파일에서 마지막 `limit`개 레코드를 읽습니다.
///
/// 빈 줄, 잘못된 JSON, 객체가 아닌 줄은 건너뜁니다.
/// 파일이 없으면 에러가 아니라 빈 결과입니다.
pub fn read_recent(path: &Path, limit: usize) -> Result<Vec<Value>, DetectError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "stats file not found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    let content = String::from_utf8_lossy(&bytes);

    let mut rows = VecDeque::with_capacity(limit.min(1024));
    let mut skipped = 0usize;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(row @ Value::Object(_)) => {
                if limit == 0 {
                    continue;
                }
                if rows.len() == limit {
                    rows.pop_front();
                }
                rows.push_back(row);
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(path = %path.display(), skipped, "skipped malformed stats lines");
    }
    Ok(rows.into())
}

/// 레코드를 카테고리별로 집계합니다.
pub fn summarize(file: &Path, rows: &[Value]) -> StatsSummary {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(attack_key(row)).or_insert(0) += 1;
    }

    StatsSummary {
        file: file.display().to_string(),
        total: rows.len(),
        counts,
        updated_at: chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.6fZ")
            .to_string(),
    }
}

/// 시각 내림차순(문자열 비교)으로 정렬한 최근 `limit`개 이벤트
pub fn recent_events(mut rows: Vec<Value>, limit: usize) -> Vec<EventRow> {
    // 안정 정렬: 시각이 같으면 파일 순서 유지
    rows.sort_by(|a, b| str_field(b, "time").cmp(str_field(a, "time")));
    rows.iter().take(limit).map(EventRow::from_value).collect()
}

/// 요청한 개수를 설정 범위로 맞춥니다.
///
/// 지정하지 않으면 기본값, 최대값을 넘으면 최대값을 씁니다.
pub fn clamp_limit(requested: Option<usize>, config: &DetectConfig) -> usize {
    requested
        .unwrap_or(config.default_event_limit)
        .min(config.max_event_limit)
}

impl EventRow {
    fn from_value(row: &Value) -> Self {
        Self {
            time: str_field(row, "time").to_owned(),
            ip: str_field(row, "ip").to_owned(),
            attack: attack_key(row),
            severity: row.get("severity").and_then(Value::as_u64),
            level: str_field(row, "level").to_owned(),
            confidence: row.get("confidence").and_then(Value::as_f64),
            url: str_field(row, "url").to_owned(),
        }
    }
}

fn str_field<'a>(row: &'a Value, key: &str) -> &'a str {
    row.get(key).and_then(Value::as_str).unwrap_or("")
}

fn attack_key(row: &Value) -> String {
    match row.get("attack") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Bool(false)) => {
            UNKNOWN_ATTACK.to_owned()
        }
        Some(other) => other.to_string(),
    }
}
