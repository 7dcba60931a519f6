//! Core analysis engine.
//!
//! The [`Analyzer`] turns a [`SeriesBatch`] into an [`AnalysisReport`]:
//! statistics per series, a deviation judgment per analyzed series, and
//! aggregate counts. It performs no I/O, reads no clock and never mutates its
//! input, so the same batch and configuration always give the same report.

use tracing::{debug, info, warn};

use crate::config::{AnalyzerConfig, Thresholds};
use crate::detector::assess;
use crate::error::{Result, ValidationError};
use crate::ingest::SeriesBatch;
use crate::report::{AnalysisReport, SeriesOutcome, SeriesReport};
use crate::stats::Statistics;
use crate::types::{Series, Severity};

/// The metrics analysis engine.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    thresholds: Thresholds,
}

impl Analyzer {
    /// Creates an analyzer with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
            thresholds: Thresholds::default(),
        }
    }

    /// Creates an analyzer with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AnalysisError::Configuration`] if the thresholds are
    /// invalid. Nothing has been analyzed at that point.
    pub fn with_config(config: AnalyzerConfig) -> Result<Self> {
        let thresholds = config.thresholds.resolve()?;
        Ok(Self { config, thresholds })
    }

    /// Returns a reference to the analyzer's configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Returns the resolved thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Analyzes every entry of a batch.
    ///
    /// Invalid entries are carried into the report's `invalid` list; empty
    /// series become `no_data` entries; everything else is analyzed. The
    /// report keeps input order.
    #[must_use]
    pub fn analyze(&self, batch: &SeriesBatch) -> AnalysisReport {
        let mut entries = Vec::with_capacity(batch.len());
        let mut invalid: Vec<ValidationError> = Vec::new();

        for entry in batch.entries() {
            match &entry.result {
                Ok(series) => entries.push(self.analyze_series(series)),
                Err(error) => {
                    warn!(
                        series = %error.series,
                        position = error.position,
                        reason = %error.reason,
                        "skipping invalid series"
                    );
                    invalid.push(error.clone());
                }
            }
        }

        let mut report = AnalysisReport::new(self.thresholds, entries, invalid);
        if self.config.include_recommendations {
            report = report.with_recommendations();
        }

        info!(
            total = report.summary.total_series,
            analyzed = report.summary.analyzed,
            no_data = report.summary.no_data,
            invalid = report.summary.invalid,
            anomalies = report.summary.anomalies,
            critical = report.summary.critical,
            "analysis complete"
        );

        report
    }

    /// Analyzes one series.
    #[must_use]
    pub fn analyze_series(&self, series: &Series) -> SeriesReport {
        let Some(statistics) = Statistics::compute(&series.samples) else {
            debug!(series = %series.id, "no data in window");
            return SeriesReport::new(series, SeriesOutcome::NoData);
        };

        let anomaly = assess(&statistics, &self.thresholds);
        debug!(
            series = %series.id,
            data_points = statistics.data_points,
            deviation = %anomaly.deviation_pct,
            severity = ?anomaly.severity,
            "analyzed series"
        );

        SeriesReport::new(series, SeriesOutcome::Analyzed { statistics, anomaly })
    }

    /// Returns the most severe flag in a batch without building a report.
    #[must_use]
    pub fn quick_check(&self, batch: &SeriesBatch) -> Option<Severity> {
        batch
            .entries()
            .iter()
            .filter_map(|entry| entry.result.as_ref().ok())
            .filter_map(|series| Statistics::compute(&series.samples))
            .filter_map(|stats| assess(&stats, &self.thresholds).severity)
            .max()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyzes a batch with the given configuration.
///
/// # Errors
///
/// Returns [`crate::AnalysisError::Configuration`] if the thresholds are
/// invalid; the batch is not touched in that case. Malformed series never
/// fail the call.
pub fn analyze(batch: &SeriesBatch, config: &AnalyzerConfig) -> Result<AnalysisReport> {
    Ok(Analyzer::with_config(config.clone())?.analyze(batch))
}
