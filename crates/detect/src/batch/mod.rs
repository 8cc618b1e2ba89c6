//! 배치 처리 -- 대량 파일 입력과 결과 파일 저장
//!
//! - [`ingest`]: JSON 배열/JSONL 파일을 정규화 레코드로 읽기
//! - [`sink`]: 알림 레코드를 CSV/JSONL로 전체 교체 저장

pub mod ingest;
pub mod sink;

pub use ingest::{BatchIngestor, IngestOutcome, resolve_input_path};
pub use sink::{PersistReport, TABLE_COLUMNS, load_tabular, persist_all, persist_filtered};
