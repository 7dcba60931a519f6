//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use triage_analyzer::{AnalysisReport, SeriesReport, Thresholds};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

impl TableDisplay for Thresholds {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Severity Thresholds")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "  MEDIUM:         >= {:.2}%", self.medium_threshold_pct)?;
        writeln!(writer, "  HIGH:           >= {:.2}%", self.deviation_threshold_pct)?;
        writeln!(writer, "  CRITICAL:       >= {:.2}%", self.critical_threshold_pct)?;
        Ok(())
    }
}

impl TableDisplay for AnalysisReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let summary = &self.summary;

        writeln!(writer, "Metrics Analysis")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(
            writer,
            "Series:         {} ({} analyzed, {} no data, {} invalid)",
            summary.total_series, summary.analyzed, summary.no_data, summary.invalid
        )?;
        writeln!(
            writer,
            "Anomalies:      {} ({} critical, {} high, {} medium)",
            summary.anomalies, summary.critical, summary.high, summary.medium
        )?;
        if let Some((start, end)) = window(&self.entries) {
            writeln!(writer, "Window:         {} to {}", timestamp(start), timestamp(end))?;
        }
        writeln!(writer)?;

        let analyzed: Vec<&SeriesReport> = self
            .entries
            .iter()
            .filter(|entry| entry.statistics().is_some())
            .collect();

        if analyzed.is_empty() {
            writeln!(writer, "No series with data to analyze.")?;
        } else {
            writeln!(
                writer,
                "{:<10} {:<40} {:>12} {:>12} {:>12} {:>12} {:>10}",
                "SEVERITY", "SERIES", "LATEST", "AVG", "MIN", "MAX", "DEVIATION"
            )?;
            writeln!(writer, "{}", "─".repeat(114))?;

            for entry in analyzed {
                let (Some(stats), Some(anomaly)) = (entry.statistics(), entry.anomaly()) else {
                    continue;
                };
                let severity = anomaly
                    .severity
                    .map_or_else(|| "-".to_string(), |s| s.to_string());
                writeln!(
                    writer,
                    "{:<10} {:<40} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>10}",
                    severity,
                    truncate(entry.id.as_str(), 40),
                    stats.latest,
                    stats.avg,
                    stats.min,
                    stats.max,
                    anomaly.deviation_pct.to_string(),
                )?;
            }
        }

        let no_data: Vec<&SeriesReport> =
            self.entries.iter().filter(|entry| entry.is_no_data()).collect();
        if !no_data.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "No Data")?;
            for entry in no_data {
                writeln!(writer, "  {}", entry.id)?;
            }
        }

        if !self.invalid.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Invalid Series")?;
            for error in &self.invalid {
                writeln!(writer, "  {}: {}", error.series, error.reason)?;
            }
        }

        if !self.recommendations.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Recommendations")?;
            for line in &self.recommendations {
                writeln!(writer, "  - {line}")?;
            }
        }

        Ok(())
    }
}

/// Earliest first sample and latest last sample across analyzed entries.
fn window(entries: &[SeriesReport]) -> Option<(i64, i64)> {
    entries
        .iter()
        .filter_map(SeriesReport::statistics)
        .map(|stats| (stats.first_timestamp, stats.latest_timestamp))
        .reduce(|(start, end), (first, latest)| (start.min(first), end.max(latest)))
}

/// Render a millisecond timestamp as UTC, falling back to the raw number.
fn timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
