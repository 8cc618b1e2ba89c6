//! 배치 입력 -- JSON 배열 또는 JSONL 파일을 정규화 레코드로 읽기
//!
//! 앞뒤 공백을 제거한 내용이 `[`로 시작하면 JSON 배열, 아니면 JSONL로 처리합니다.
//! JSONL의 잘못된 줄은 건너뛰고 계속 읽으며, 파일 전체를 읽을 수 없으면
//! 실패를 기록하고 빈 결과를 돌려줍니다.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, error, info};

use webwatch_core::metrics as m;
use webwatch_core::types::NormalizedRecord;

use crate::error::DetectError;
use crate::normalizer::LogNormalizer;

/// 입력 경로를 확인합니다.
///
/// 경로가 존재하지 않으면 페이로드 디렉토리 아래에서 같은 이름을 찾습니다.
/// 둘 다 없으면 원래 경로를 그대로 돌려줍니다.
pub fn resolve_input_path(path: &Path, payload_dir: &Path) -> PathBuf {
    if path.exists() {
        return path.to_path_buf();
    }

    let guess = payload_dir.join(path);
    if guess.exists() {
        debug!(
            requested = %path.display(),
            resolved = %guess.display(),
            "input resolved under payload directory"
        );
        guess
    } else {
        path.to_path_buf()
    }
}

/// 입력 읽기 결과
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutcome {
    /// 정규화된 레코드 (원래 순서)
    pub records: Vec<NormalizedRecord>,
    /// 건너뛴 잘못된 줄 수
    pub skipped: usize,
}

/// 배치 입력기
#[derive(Debug, Clone)]
pub struct BatchIngestor {
    normalizer: LogNormalizer,
}

impl BatchIngestor {
    /// 정규화기를 받아 입력기를 생성합니다.
    pub fn new(normalizer: LogNormalizer) -> Self {
        Self { normalizer }
    }

    /// 파일을 읽어 정규화합니다. 실패하면 에러를 반환합니다.
    ///
    /// 파일을 읽을 수 없거나 JSON 배열 전체가 잘못된 경우에만 실패합니다.
    pub fn try_ingest(&self, path: &Path) -> Result<IngestOutcome, DetectError> {
        let ingest_err = |reason: String| DetectError::Ingest {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| ingest_err(e.to_string()))?;
        let trimmed = content.trim();

        let outcome = if trimmed.starts_with('[') {
            let items: Vec<Value> =
                serde_json::from_str(trimmed).map_err(|e| ingest_err(e.to_string()))?;
            IngestOutcome {
                records: items.iter().map(|item| self.normalizer.normalize(item)).collect(),
                skipped: 0,
            }
        } else {
            self.ingest_lines(trimmed)
        };

        metrics::counter!(m::BATCH_RECORDS_INGESTED_TOTAL).increment(outcome.records.len() as u64);
        metrics::counter!(m::BATCH_LINES_SKIPPED_TOTAL).increment(outcome.skipped as u64);
        info!(
            path = %path.display(),
            records = outcome.records.len(),
            skipped = outcome.skipped,
            "bulk file ingested"
        );

        Ok(outcome)
    }

    /// 파일을 읽어 정규화합니다.
    ///
    /// 실패는 기록만 하고 빈 결과를 반환합니다.
    pub fn ingest(&self, path: &Path) -> Vec<NormalizedRecord> {
        match self.try_ingest(path) {
            Ok(outcome) => outcome.records,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read bulk file");
                Vec::new()
            }
        }
    }

    fn ingest_lines(&self, content: &str) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(raw) => outcome.records.push(self.normalizer.normalize(&raw)),
                Err(e) => {
                    debug!(line = line_no + 1, error = %e, "skipping malformed line");
                    outcome.skipped += 1;
                }
            }
        }

        outcome
    }
}
