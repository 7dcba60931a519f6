//! Analyze command implementation.
//!
//! Reads an already-fetched metrics document, runs it through the analyzer
//! and writes the report. With `--fail-on`, a report containing an anomaly
//! at or above the given severity turns into a non-zero exit.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::debug;
use triage_analyzer::{parse_document, AnalysisReport, Analyzer, AnalyzerConfig, Severity};

use crate::cli::AnalyzeArgs;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Analyze command executor.
#[derive(Debug)]
pub struct AnalyzeCommand {
    analyzer: Analyzer,
    fail_on: Option<Severity>,
}

impl AnalyzeCommand {
    /// Create an analyze command, validating the thresholds up front.
    ///
    /// # Errors
    ///
    /// Returns an error if the thresholds are invalid.
    pub fn new(config: AnalyzerConfig) -> Result<Self, CliError> {
        Ok(Self {
            analyzer: Analyzer::with_config(config)?,
            fail_on: None,
        })
    }

    /// Create an analyze command from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is invalid.
    pub fn from_args(args: &AnalyzeArgs) -> Result<Self, CliError> {
        let config = super::load_config(&args.thresholds)?;
        let config = if args.no_recommendations {
            config.with_recommendations(false)
        } else {
            config
        };
        Ok(Self::new(config)?.with_fail_on(args.fail_on.map(Severity::from)))
    }

    /// Set the severity that makes the command fail.
    #[must_use]
    pub const fn with_fail_on(mut self, severity: Option<Severity>) -> Self {
        self.fail_on = severity;
        self
    }

    /// Analyze a metrics document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document as a whole is malformed. Malformed
    /// individual series end up in the report instead.
    pub fn run(&self, document: &str) -> Result<AnalysisReport, CliError> {
        let batch = parse_document(document)?;
        debug!(series = batch.len(), "parsed metrics document");
        Ok(self.analyzer.analyze(&batch))
    }

    /// Analyze a document and write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if analysis or output fails, or
    /// [`CliError::Threshold`] when the report reaches the fail-on severity.
    pub fn execute<W: Write>(
        &self,
        document: &str,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<AnalysisReport, CliError> {
        let report = self.run(document)?;
        self.write_report(&report, writer, format)?;
        Ok(report)
    }

    /// Write a finished report, then apply the `--fail-on` check.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails, or [`CliError::Threshold`] when the
    /// report reaches the fail-on severity.
    pub fn write_report<W: Write>(
        &self,
        report: &AnalysisReport,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        format.write(writer, report)?;
        writer.flush()?;

        match self.fail_on.filter(|s| report.has_severity_at_least(*s)) {
            Some(severity) => Err(CliError::Threshold(severity)),
            None => Ok(()),
        }
    }
}

/// Read the input document from a file, or from stdin when `path` is `None`.
///
/// # Errors
///
/// Returns an error if the input cannot be read.
pub fn read_document(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|source| CliError::File {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut document = String::new();
            io::stdin().lock().read_to_string(&mut document)?;
            Ok(document)
        }
    }
}
