//! Benchmark report output
//!
//! Renders a [`BenchmarkReport`] as JSON or as a human-readable text summary,
//! and persists both renderings side by side.
//!
//! # Example
//!
//! ```no_run
//! use crawl_bench::report::BenchmarkReport;
//! use crawl_bench::reporter::{OutputFormat, ReportWriter, Reporter};
//!
//! # fn example(report: BenchmarkReport) -> anyhow::Result<()> {
//! Reporter::new(OutputFormat::Text).report(&report)?;
//!
//! let (json_path, text_path) = ReportWriter::persist(&report, "results")?;
//! println!("saved {} and {}", json_path.display(), text_path.display());
//! # Ok(())
//! # }
//! ```

mod json;
mod text;

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::report::BenchmarkReport;

pub use json::JsonReporter;
pub use text::TextReporter;

/// Output format for benchmark reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Plain-text summary
    #[default]
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "pretty" => Ok(OutputFormat::JsonPretty),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(format!(
                "unknown format '{}', expected text, json or json-pretty",
                other
            )),
        }
    }
}

/// Reporter for benchmark reports
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the report to stdout
    pub fn report(&self, report: &BenchmarkReport) -> Result<()> {
        let output = self.format_report(report)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        if !output.ends_with('\n') {
            writeln!(stdout)?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, report: &BenchmarkReport, path: P) -> Result<()> {
        let path = path.as_ref();
        let output = self.format_report(report)?;
        fs::write(path, output)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn format_report(&self, report: &BenchmarkReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => JsonReporter::format(report, false),
            OutputFormat::JsonPretty => JsonReporter::format(report, true),
            OutputFormat::Text => TextReporter::format(report),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

/// Writes the persisted pair of report files
pub struct ReportWriter;

impl ReportWriter {
    /// File stem shared by both files, e.g. `benchmark-2024-05-01T10-20-30-123Z`
    pub fn file_stem(report: &BenchmarkReport) -> String {
        format!(
            "benchmark-{}",
            report.timestamp.format("%Y-%m-%dT%H-%M-%S-%3fZ")
        )
    }

    /// Write `<stem>.json` (pretty JSON) and `<stem>.txt` (text summary) into
    /// `dir`, creating it if needed. Returns `(json_path, text_path)`.
    pub fn persist<P: AsRef<Path>>(
        report: &BenchmarkReport,
        dir: P,
    ) -> Result<(PathBuf, PathBuf)> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create results directory {}", dir.display()))?;

        let stem = Self::file_stem(report);
        let json_path = dir.join(format!("{}.json", stem));
        let text_path = dir.join(format!("{}.txt", stem));

        Reporter::new(OutputFormat::JsonPretty)
            .write_to_file(report, &json_path)?;
        Reporter::new(OutputFormat::Text).write_to_file(report, &text_path)?;

        info!(json = %json_path.display(), text = %text_path.display(), "Report saved");
        Ok((json_path, text_path))
    }
}
