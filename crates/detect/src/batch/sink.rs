//! 결과 저장 -- 알림 레코드를 표 형식(CSV)과 줄 단위(JSONL) 파일로 저장
//!
//! 모든 출력은 전체 파일 교체입니다. 같은 디렉토리의 임시 파일에 먼저 쓰고
//! 이름을 바꾸므로, 중간에 중단되어도 이전 파일이나 새 파일 중 하나만 남습니다.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use webwatch_core::metrics as m;
use webwatch_core::types::{AlertRecord, Category, SeverityTier};

use crate::config::DetectConfig;
use crate::error::DetectError;

/// 표 형식 파일의 고정 열
pub const TABLE_COLUMNS: [&str; 9] = [
    "time",
    "ip",
    "method",
    "url",
    "body",
    "attack",
    "confidence",
    "severity",
    "level",
];

/// 전체 저장 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReport {
    /// 표 형식 파일 경로
    pub table_path: PathBuf,
    /// 줄 단위 파일 경로
    pub lines_path: PathBuf,
    /// 저장한 레코드 수
    pub records: usize,
}

/// 모든 레코드를 표 형식과 줄 단위 파일로 저장합니다.
///
/// 출력 디렉토리가 없으면 생성하고, 기존 파일은 덮어씁니다.
pub fn persist_all(
    records: &[AlertRecord],
    config: &DetectConfig,
) -> Result<PersistReport, DetectError> {
    let table_path = config.table_path();
    let lines_path = config.lines_path();

    write_table(records, &table_path)?;
    write_lines(records.iter(), &lines_path)?;

    metrics::counter!(m::BATCH_RECORDS_PERSISTED_TOTAL).increment(records.len() as u64);
    info!(
        records = records.len(),
        table = %table_path.display(),
        lines = %lines_path.display(),
        "results saved"
    );

    Ok(PersistReport {
        table_path,
        lines_path,
        records: records.len(),
    })
}

/// 조건에 맞는 레코드만 줄 단위 파일로 저장합니다.
///
/// 저장한 레코드 수를 반환합니다. 맞는 레코드가 없어도 빈 파일로 교체합니다.
pub fn persist_filtered<F>(
    records: &[AlertRecord],
    predicate: F,
    path: &Path,
) -> Result<usize, DetectError>
where
    F: Fn(&AlertRecord) -> bool,
{
    let mut count = 0usize;
    write_lines(
        records.iter().filter(|r| predicate(r)).inspect(|_| count += 1),
        path,
    )?;
    debug!(path = %path.display(), records = count, "filtered results saved");
    Ok(count)
}

/// 표 형식 파일을 다시 읽습니다. 잘못된 행은 건너뜁니다.
pub fn load_tabular(path: &Path) -> Result<Vec<AlertRecord>, DetectError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for (row_no, row) in reader.deserialize::<TableRow>().enumerate() {
        match row.map_err(DetectError::from).and_then(TableRow::into_alert) {
            Ok(record) => records.push(record),
            Err(e) => debug!(row = row_no + 1, error = %e, "skipping malformed row"),
        }
    }

    Ok(records)
}

/// CSV 한 행 (신뢰도는 소수 둘째 자리 문자열)
#[derive(Debug, Deserialize)]
struct TableRow {
    time: String,
    ip: String,
    method: String,
    url: String,
    body: String,
    attack: String,
    confidence: f64,
    severity: u8,
    level: String,
}

impl TableRow {
    fn into_alert(self) -> Result<AlertRecord, DetectError> {
        let bad = |field: &str, value: &str| DetectError::Ingest {
            path: "table".to_owned(),
            reason: format!("invalid {} '{}'", field, value),
        };
        let attack = Category::from_str_loose(&self.attack)
            .ok_or_else(|| bad("attack", &self.attack))?;
        let level =
            SeverityTier::from_str_loose(&self.level).ok_or_else(|| bad("level", &self.level))?;

        Ok(AlertRecord {
            time: self.time,
            ip: self.ip,
            method: self.method,
            url: self.url,
            body: self.body,
            attack,
            confidence: self.confidence,
            severity: self.severity,
            level,
        })
    }
}

fn write_table(records: &[AlertRecord], path: &Path) -> Result<(), DetectError> {
    write_atomic(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(TABLE_COLUMNS)?;
        for r in records {
            let confidence = format!("{:.2}", r.confidence);
            let severity = r.severity.to_string();
            let level = r.level.to_string();
            writer.write_record([
                r.time.as_str(),
                r.ip.as_str(),
                r.method.as_str(),
                r.url.as_str(),
                r.body.as_str(),
                r.attack.label(),
                confidence.as_str(),
                severity.as_str(),
                level.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    })
}

fn write_lines<'a, I>(records: I, path: &Path) -> Result<(), DetectError>
where
    I: Iterator<Item = &'a AlertRecord>,
{
    write_atomic(path, |out| {
        for record in records {
            serde_json::to_writer(&mut *out, record)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    })
}

/// 같은 디렉토리의 임시 파일에 쓴 뒤 대상 경로로 이름을 바꿉니다.
fn write_atomic<F>(path: &Path, write: F) -> Result<(), DetectError>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<(), DetectError>,
{
    let persist_err = |reason: String| DetectError::Persist {
        path: path.display().to_string(),
        reason,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| persist_err(e.to_string()))?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| persist_err(e.to_string()))?;
    {
        let mut out = BufWriter::new(&mut tmp);
        write(&mut out).map_err(|e| persist_err(e.to_string()))?;
        out.flush().map_err(|e| persist_err(e.to_string()))?;
    }
    tmp.persist(path).map_err(|e| persist_err(e.error.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(url: &str, attack: Category, severity: u8) -> AlertRecord {
        AlertRecord {
            time: "2024-01-01T00:00:00".to_owned(),
            ip: "10.0.0.1".to_owned(),
            method: "GET".to_owned(),
            url: url.to_owned(),
            body: "a,b \"quoted\"".to_owned(),
            attack,
            confidence: 87.25,
            severity,
            level: SeverityTier::from_score(severity),
        }
    }

    fn config_in(dir: &Path) -> DetectConfig {
        DetectConfig {
            output_dir: dir.join("results").display().to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn persist_all_writes_both_forms() {
        // Given
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let records = vec![
            alert("/a", Category::SqlInjection, 85),
            alert("/b", Category::Benign, 0),
        ];

        // When
        let report = persist_all(&records, &config).unwrap();

        // Then: 출력 디렉토리가 생성되고 두 파일 모두 기록됨
        assert_eq!(report.records, 2);
        let table = std::fs::read_to_string(&report.table_path).unwrap();
        let mut lines = table.lines();
        assert_eq!(
            lines.next(),
            Some("time,ip,method,url,body,attack,confidence,severity,level")
        );
        let first = lines.next().unwrap();
        assert!(first.contains("SQL Injection"));
        assert!(first.contains(",87.25,"));
        assert!(first.ends_with(",85,HIGH"));

        let jsonl = std::fs::read_to_string(&report.lines_path).unwrap();
        let parsed: Vec<AlertRecord> = jsonl
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed, records);
    }

    #[test]
    fn persist_all_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        persist_all(
            &[
                alert("/1", Category::Xss, 50),
                alert("/2", Category::Xss, 50),
            ],
            &config,
        )
        .unwrap();
        let report = persist_all(&[alert("/3", Category::Xss, 50)], &config).unwrap();

        let jsonl = std::fs::read_to_string(report.lines_path).unwrap();
        assert_eq!(jsonl.lines().count(), 1);
        assert!(jsonl.contains("/3"));
    }

    #[test]
    fn persist_filtered_writes_matching_subset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suspect.jsonl");
        let records = vec![
            alert("/login", Category::BrokenAuthentication, 70),
            alert("/x", Category::Xss, 50),
            alert("/session", Category::BrokenAuthentication, 75),
        ];

        let count = persist_filtered(
            &records,
            |r| r.attack == Category::BrokenAuthentication,
            &path,
        )
        .unwrap();

        assert_eq!(count, 2);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains("\"/x\""));
    }

    #[test]
    fn persist_filtered_with_no_matches_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.jsonl");
        std::fs::write(&path, "stale\n").unwrap();

        let count = persist_filtered(&[alert("/", Category::Benign, 0)], |_| false, &path).unwrap();
        assert_eq!(count, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn load_tabular_reads_back_and_skips_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let report = persist_all(&[alert("/a", Category::CommandInjection, 95)], &config).unwrap();

        // 잘못된 행 추가
        let mut content = std::fs::read_to_string(&report.table_path).unwrap();
        content.push_str("t,ip,GET,/b,,Phishing,10.00,10,LOW\n");
        content.push_str("t,ip,GET,/c,,XSS,not-a-number,10,LOW\n");
        std::fs::write(&report.table_path, content).unwrap();

        let loaded = load_tabular(&report.table_path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].attack, Category::CommandInjection);
        assert_eq!(loaded[0].confidence, 87.25);
        assert_eq!(loaded[0].level, SeverityTier::Critical);
        assert_eq!(loaded[0].body, "a,b \"quoted\"");
    }

    #[test]
    fn load_tabular_missing_file_is_error() {
        assert!(load_tabular(Path::new("/nonexistent/alert_results.csv")).is_err());
    }
}
