//! `webwatch stats` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use webwatch_core::config::WebwatchConfig;
use webwatch_detect::stats::clamp_limit;
use webwatch_detect::{DetectConfig, EventRow, StatsSummary, read_recent, recent_events, summarize};

use crate::cli::StatsArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, truncate};

/// Execute the `stats` command.
pub async fn execute(
    args: StatsArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = WebwatchConfig::load(config_path).await?;
    let detect = DetectConfig::from_core(&config);
    detect.validate()?;

    let report = build_stats(&args, &detect)?;
    writer.render(&report)?;

    Ok(())
}

/// Read the result file once and build both the summary and the event list.
pub fn build_stats(args: &StatsArgs, detect: &DetectConfig) -> Result<StatsReport, CliError> {
    let file = args
        .file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&detect.alert_file));
    let rows = read_recent(&file, detect.read_limit)?;
    let summary = summarize(&file, &rows);
    let events = recent_events(rows, clamp_limit(args.limit, detect));

    Ok(StatsReport { summary, events })
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub summary: StatsSummary,
    pub events: Vec<EventRow>,
}

impl Render for StatsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "File: {}", self.summary.file.bold())?;
        writeln!(w, "Updated: {}", self.summary.updated_at)?;
        writeln!(w, "Total: {}", self.summary.total)?;

        if self.summary.total == 0 {
            writeln!(w, "{}", "No records.".yellow())?;
            return Ok(());
        }

        writeln!(w)?;
        writeln!(w, "{:<24} {:>8}", "Attack", "Count")?;
        writeln!(w, "{}", "-".repeat(33))?;
        for (attack, count) in &self.summary.counts {
            writeln!(w, "{:<24} {:>8}", attack, count)?;
        }

        writeln!(w)?;
        writeln!(w, "Recent events ({}):", self.events.len())?;
        writeln!(
            w,
            "{:<26} {:<15} {:<22} {:>5} {:<9} {:>7}  URL",
            "Time", "IP", "Attack", "Score", "Level", "Conf%"
        )?;
        writeln!(w, "{}", "-".repeat(100))?;
        for e in &self.events {
            let severity = e
                .severity
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_owned());
            let confidence = e
                .confidence
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "-".to_owned());
            writeln!(
                w,
                "{:<26} {:<15} {:<22} {:>5} {:<9} {:>7}  {}",
                truncate(&e.time, 26),
                truncate(&e.ip, 15),
                truncate(&e.attack, 22),
                severity,
                e.level,
                confidence,
                truncate(&e.url, 60)
            )?;
        }

        Ok(())
    }
}
