//! Integration tests for `webwatch scan` and `webwatch stats`.
//!
//! Each test builds a throwaway layout (config, model bundle, payload and
//! output directories) under a temp dir and drives the command handlers.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use webwatch_cli::cli::{OutputFormat, ScanArgs, StatsArgs};
use webwatch_cli::commands::{scan, stats};
use webwatch_cli::error::CliError;
use webwatch_core::config::WebwatchConfig;
use webwatch_core::types::AlertRecord;
use webwatch_detect::DetectConfig;

const MODEL_BUNDLE: &str = r#"{
    "bias": [0.5, 0.0, 0.0, 0.0, 0.0],
    "token_weights": {
        "union":  [0.0, 6.0, 0.0, 0.0, 0.0],
        "select": [0.0, 6.0, 0.0, 0.0, 0.0],
        "script": [0.0, 0.0, 6.0, 0.0, 0.0],
        "alert":  [0.0, 0.0, 6.0, 0.0, 0.0],
        "jwt":    [0.0, 0.0, 0.0, 0.0, 6.0],
        "none":   [0.0, 0.0, 0.0, 0.0, 6.0]
    }
}"#;

const MIXED_EVENTS: &str = r#"{"time": "2024-01-01T00:00:01", "ip": "10.0.0.1", "url": "/items?id=1%20UNION%20SELECT%20name"}
{"time": "2024-01-01T00:00:02", "ip": "10.0.0.2", "url": "/q", "body": "<script>alert(1)</script>"}
not json at all
{"time": "2024-01-01T00:00:03", "ip": "10.0.0.3", "url": "/api", "body": "jwt alg none"}
{"time": "2024-01-01T00:00:04", "ip": "10.0.0.4", "url": "/index.html"}
"#;

struct Layout {
    dir: TempDir,
    config_path: PathBuf,
}

impl Layout {
    fn new() -> Self {
        let dir = TempDir::new().expect("should create temp dir");
        let root = dir.path();
        fs::create_dir_all(root.join("payloads")).expect("payload dir");
        fs::write(root.join("model.json"), MODEL_BUNDLE).expect("model");

        let config_path = root.join("webwatch.toml");
        let config = format!(
            r#"
[classifier]
model_path = "{model}"

[batch]
payload_dir = "{payloads}"
output_dir = "{results}"

[stats]
alert_file = "{results}/alert_results.jsonl"
"#,
            model = root.join("model.json").display(),
            payloads = root.join("payloads").display(),
            results = root.join("results").display(),
        );
        fs::write(&config_path, config).expect("config");

        Self { dir, config_path }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn payload(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join("payloads").join(name);
        fs::write(&path, content).expect("payload");
        path
    }

    async fn detect(&self) -> DetectConfig {
        let config = WebwatchConfig::load(&self.config_path)
            .await
            .expect("config should load");
        DetectConfig::from_core(&config)
    }
}

fn scan_args(path: impl Into<PathBuf>, expect: Option<&str>) -> ScanArgs {
    ScanArgs {
        path: path.into(),
        expect: expect.map(str::to_owned),
        min_severity: 40,
        top: 20,
    }
}

fn read_alerts(path: &Path) -> Vec<AlertRecord> {
    fs::read_to_string(path)
        .expect("result file")
        .lines()
        .map(|l| serde_json::from_str(l).expect("alert line"))
        .collect()
}

#[tokio::test]
async fn test_scan_writes_all_result_files() {
    // Given: a mixed JSONL file with one malformed line
    let layout = Layout::new();
    let input = layout.payload("mixed.jsonl", MIXED_EVENTS);
    let detect = layout.detect().await;

    // When
    let report = scan::run_scan(&scan_args(&input, None), &detect).expect("scan should succeed");

    // Then
    assert_eq!(report.records, 4);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.counts["SQL Injection"], 1);
    assert_eq!(report.counts["XSS"], 1);
    assert_eq!(report.counts["Broken Authentication"], 1);
    assert_eq!(report.counts["Benign"], 1);

    let lines = read_alerts(&detect.lines_path());
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0].ip, "10.0.0.1");

    let table = fs::read_to_string(detect.table_path()).expect("table file");
    assert_eq!(table.lines().count(), 5);

    let suspects = read_alerts(&detect.suspect_path());
    assert_eq!(suspects.len(), 1);
    assert_eq!(suspects[0].url, "/api");
    assert_eq!(report.outputs.suspects.records, 1);
    assert!(report.outputs.misclassified.is_none());
}

#[tokio::test]
async fn test_scan_report_lists_flagged_events_by_severity() {
    let layout = Layout::new();
    let input = layout.payload("mixed.jsonl", MIXED_EVENTS);
    let detect = layout.detect().await;

    let report = scan::run_scan(&scan_args(&input, None), &detect).expect("scan");

    // benign event is never flagged
    assert_eq!(report.flagged, 3);
    assert!(report.events.iter().all(|e| e.severity >= 40));
    assert!(report.events.iter().all(|e| e.attack != "Benign"));
    assert!(
        report
            .events
            .windows(2)
            .all(|pair| pair[0].severity >= pair[1].severity)
    );
}

#[tokio::test]
async fn test_scan_resolves_name_under_payload_dir() {
    let layout = Layout::new();
    layout.payload("sqli.json", r#"[{"url": "/a?q=union select"}, {"url": "/b"}]"#);
    let detect = layout.detect().await;

    let report = scan::run_scan(&scan_args("sqli.json", None), &detect).expect("scan");

    assert_eq!(report.records, 2);
    assert!(report.input.ends_with("payloads/sqli.json"));
}

#[tokio::test]
async fn test_scan_expect_writes_misclassified_file() {
    // Given: a file expected to hold only SQL injection
    let layout = Layout::new();
    let input = layout.payload("sqli.jsonl", MIXED_EVENTS);
    let detect = layout.detect().await;

    // When
    let report = scan::run_scan(&scan_args(&input, Some("sqli")), &detect).expect("scan");

    // Then: every other prediction lands in misclassified_sqli.jsonl
    let misclassified = report.outputs.misclassified.expect("misclassified output");
    assert_eq!(misclassified.expected, "SQL Injection");
    assert_eq!(misclassified.file.records, 3);

    let path = layout.root().join("results").join("misclassified_sqli.jsonl");
    let rows = read_alerts(&path);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.url != "/items?id=1%20UNION%20SELECT%20name"));
}

#[tokio::test]
async fn test_scan_invalid_expect_is_command_error() {
    let layout = Layout::new();
    let input = layout.payload("mixed.jsonl", MIXED_EVENTS);
    let detect = layout.detect().await;

    let err = scan::run_scan(&scan_args(&input, Some("phishing")), &detect).unwrap_err();
    assert!(matches!(err, CliError::Command(_)));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_scan_empty_input_is_no_data() {
    let layout = Layout::new();
    let input = layout.payload("empty.jsonl", "\n\n");
    let detect = layout.detect().await;

    let err = scan::run_scan(&scan_args(&input, None), &detect).unwrap_err();

    assert!(matches!(err, CliError::Scan(ref msg) if msg.contains("no data")));
    assert_eq!(err.exit_code(), 4);
    assert!(!detect.lines_path().exists(), "nothing should be written");
}

#[tokio::test]
async fn test_scan_missing_input_is_no_data() {
    let layout = Layout::new();
    let detect = layout.detect().await;

    let err = scan::run_scan(&scan_args("missing.jsonl", None), &detect).unwrap_err();
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_scan_missing_model_fails() {
    let layout = Layout::new();
    let input = layout.payload("mixed.jsonl", MIXED_EVENTS);
    fs::remove_file(layout.root().join("model.json")).expect("remove model");
    let detect = layout.detect().await;

    let err = scan::run_scan(&scan_args(&input, None), &detect).unwrap_err();

    assert!(matches!(err, CliError::Scan(ref msg) if msg.contains("model.json")));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_scan_execute_missing_config() {
    let err = scan::execute(
        scan_args("x.jsonl", None),
        Path::new("/nonexistent/webwatch.toml"),
        &webwatch_cli::output::OutputWriter::new(OutputFormat::Json),
    )
    .await
    .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_stats_after_scan() {
    // Given: a completed scan
    let layout = Layout::new();
    let input = layout.payload("mixed.jsonl", MIXED_EVENTS);
    let detect = layout.detect().await;
    scan::run_scan(&scan_args(&input, None), &detect).expect("scan");

    // When: stats read the default alert file
    let report = stats::build_stats(
        &StatsArgs {
            file: None,
            limit: Some(2),
        },
        &detect,
    )
    .expect("stats");

    // Then
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.counts.values().sum::<usize>(), 4);
    assert_eq!(report.events.len(), 2);
    assert_eq!(report.events[0].time, "2024-01-01T00:00:04");
    assert_eq!(report.events[1].time, "2024-01-01T00:00:03");
}
