//! `webwatch scan` command handler

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use webwatch_core::config::WebwatchConfig;
use webwatch_core::types::{AlertRecord, Category, SeverityTier};
use webwatch_detect::batch::{BatchIngestor, IngestOutcome, resolve_input_path};
use webwatch_detect::{AlertAssembler, ClassifierClient, DetectConfig, persist_all, persist_filtered};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, truncate};

/// Execute the `scan` command.
pub async fn execute(
    args: ScanArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = WebwatchConfig::load(config_path).await?;
    let detect = DetectConfig::from_core(&config);
    detect.validate()?;

    let report = run_scan(&args, &detect)?;
    writer.render(&report)?;

    Ok(())
}

/// Ingest, classify and persist one input file.
///
/// Returns `CliError::Scan` when the input yields no records or an event
/// cannot be classified.
pub fn run_scan(args: &ScanArgs, detect: &DetectConfig) -> Result<ScanReport, CliError> {
    let expected = args.expect.as_deref().map(parse_category).transpose()?;
    let input = resolve_input_path(&args.path, Path::new(&detect.payload_dir));

    let classifier = Arc::new(ClassifierClient::from_config(detect));
    let assembler = AlertAssembler::new(classifier)?;
    let ingestor = BatchIngestor::new(assembler.normalizer().clone());

    let outcome = ingestor.try_ingest(&input).unwrap_or_else(|e| {
        warn!(path = %input.display(), error = %e, "failed to read input");
        IngestOutcome::default()
    });
    if outcome.records.is_empty() {
        return Err(CliError::Scan(format!("no data in {}", input.display())));
    }
    info!(path = %input.display(), records = outcome.records.len(), "scanning");

    let alerts = outcome
        .records
        .into_iter()
        .map(|record| assembler.assemble_record(record))
        .collect::<Result<Vec<_>, _>>()?;

    let persisted = persist_all(&alerts, detect)?;

    let suspect_path = detect.suspect_path();
    let suspects = persist_filtered(
        &alerts,
        |a| a.attack == Category::BrokenAuthentication,
        &suspect_path,
    )?;

    let misclassified = match expected {
        Some(category) => {
            let path = misclassified_path(detect, category);
            let count = persist_filtered(&alerts, |a| a.attack != category, &path)?;
            Some(Misclassified {
                expected: category.label().to_owned(),
                file: OutputFile::new(&path, count),
            })
        }
        None => None,
    };

    Ok(build_report(
        input,
        &alerts,
        outcome.skipped,
        OutputFile::new(&persisted.table_path, persisted.records),
        OutputFile::new(&persisted.lines_path, persisted.records),
        OutputFile::new(&suspect_path, suspects),
        misclassified,
        args.min_severity,
        args.top,
    ))
}

/// `misclassified_<slug>.jsonl` in the output directory.
pub fn misclassified_path(detect: &DetectConfig, expected: Category) -> PathBuf {
    Path::new(&detect.output_dir).join(format!("misclassified_{}.jsonl", expected.slug()))
}

fn parse_category(s: &str) -> Result<Category, CliError> {
    Category::from_str_loose(s).ok_or_else(|| {
        CliError::Command(format!(
            "invalid category: {} (expected: benign, sqli, xss, cmdi, broken_auth)",
            s
        ))
    })
}

#[allow(clippy::too_many_arguments)]
fn build_report(
    input: PathBuf,
    alerts: &[AlertRecord],
    skipped: usize,
    table: OutputFile,
    lines: OutputFile,
    suspects: OutputFile,
    misclassified: Option<Misclassified>,
    min_severity: u8,
    top: usize,
) -> ScanReport {
    let mut counts = BTreeMap::new();
    let mut levels = BTreeMap::new();
    for alert in alerts {
        *counts.entry(alert.attack.label().to_owned()).or_insert(0) += 1;
        *levels.entry(alert.level.to_string()).or_insert(0) += 1;
    }

    let mut flagged: Vec<&AlertRecord> = alerts
        .iter()
        .filter(|a| a.severity >= min_severity)
        .collect();
    let flagged_total = flagged.len();
    // severity desc, then confidence desc
    flagged.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });

    ScanReport {
        input: input.display().to_string(),
        records: alerts.len(),
        skipped,
        counts,
        levels,
        outputs: ScanOutputs {
            table,
            lines,
            suspects,
            misclassified,
        },
        min_severity,
        flagged: flagged_total,
        events: flagged
            .into_iter()
            .take(top)
            .map(ScanEvent::from)
            .collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub input: String,
    pub records: usize,
    pub skipped: usize,
    pub counts: BTreeMap<String, usize>,
    pub levels: BTreeMap<String, usize>,
    pub outputs: ScanOutputs,
    pub min_severity: u8,
    /// Events at or above `min_severity` (before the `--top` cut).
    pub flagged: usize,
    pub events: Vec<ScanEvent>,
}

#[derive(Debug, Serialize)]
pub struct ScanOutputs {
    pub table: OutputFile,
    pub lines: OutputFile,
    pub suspects: OutputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub misclassified: Option<Misclassified>,
}

#[derive(Debug, Serialize)]
pub struct OutputFile {
    pub path: String,
    pub records: usize,
}

impl OutputFile {
    fn new(path: &Path, records: usize) -> Self {
        Self {
            path: path.display().to_string(),
            records,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Misclassified {
    pub expected: String,
    pub file: OutputFile,
}

#[derive(Debug, Serialize)]
pub struct ScanEvent {
    pub attack: String,
    pub level: SeverityTier,
    pub severity: u8,
    pub confidence: f64,
    pub ip: String,
    pub time: String,
    pub url: String,
}

impl From<&AlertRecord> for ScanEvent {
    fn from(alert: &AlertRecord) -> Self {
        Self {
            attack: alert.attack.label().to_owned(),
            level: alert.level,
            severity: alert.severity,
            confidence: alert.confidence,
            ip: alert.ip.clone(),
            time: alert.time.clone(),
            url: alert.url.clone(),
        }
    }
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scan: {}", self.input.bold())?;
        writeln!(w, "Records: {} (skipped lines: {})", self.records, self.skipped)?;
        let breakdown: Vec<String> = self
            .counts
            .iter()
            .map(|(attack, n)| format!("{}={}", attack, n))
            .collect();
        writeln!(w, "Categories: {}", breakdown.join(", "))?;
        writeln!(w)?;

        writeln!(w, "Saved:")?;
        for file in [&self.outputs.table, &self.outputs.lines] {
            writeln!(w, "  {} ({} records)", file.path, file.records)?;
        }
        writeln!(
            w,
            "  {} ({} suspects)",
            self.outputs.suspects.path,
            self.outputs.suspects.records.to_string().yellow()
        )?;
        if let Some(m) = &self.outputs.misclassified {
            let count = if m.file.records > 0 {
                m.file.records.to_string().red().bold()
            } else {
                m.file.records.to_string().green()
            };
            writeln!(
                w,
                "  {} ({} not predicted as {})",
                m.file.path, count, m.expected
            )?;
        }
        writeln!(w)?;

        if self.events.is_empty() {
            writeln!(
                w,
                "{}",
                format!("No events with severity >= {}.", self.min_severity).green()
            )?;
            return Ok(());
        }

        writeln!(
            w,
            "Top events (severity >= {}, showing {} of {}):",
            self.min_severity,
            self.events.len(),
            self.flagged
        )?;
        writeln!(
            w,
            "{:<22} {:<9} {:>5} {:>7}  {:<15} {:<26} URL",
            "Attack", "Level", "Score", "Conf%", "IP", "Time"
        )?;
        writeln!(w, "{}", "-".repeat(100))?;

        for e in &self.events {
            let level = e.level.to_string();
            let level_colored = match e.level {
                SeverityTier::Critical => level.red().bold(),
                SeverityTier::High => level.red(),
                SeverityTier::Medium => level.yellow(),
                SeverityTier::Low => level.normal(),
                SeverityTier::Safe => level.dimmed(),
            };
            writeln!(
                w,
                "{:<22} {:<9} {:>5} {:>7.2}  {:<15} {:<26} {}",
                e.attack,
                level_colored,
                e.severity,
                e.confidence,
                e.ip,
                truncate(&e.time, 26),
                truncate(&e.url, 60)
            )?;
        }

        Ok(())
    }
}
