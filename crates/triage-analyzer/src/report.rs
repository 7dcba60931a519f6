//! The structured result of an analysis pass.
//!
//! An [`AnalysisReport`] is the sole input of downstream renderers. Analyzed
//! and no-data series are kept in `entries` in input order; series that
//! failed validation are listed apart in `invalid` so an operator can tell
//! "no incident signal" from "could not analyze this".

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::detector::Anomaly;
use crate::error::ValidationError;
use crate::stats::Statistics;
use crate::types::{Series, SeriesId, Severity};

/// What the analyzer concluded about one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeriesOutcome {
    /// The series had samples and was analyzed.
    Analyzed {
        /// Summary statistics of the window.
        statistics: Statistics,
        /// Deviation judgment.
        anomaly: Anomaly,
    },
    /// The backend returned no samples for the window.
    NoData,
}

/// One analyzed or empty series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesReport {
    /// Identifier of the series within the batch.
    pub id: SeriesId,
    /// Metric name.
    pub metric: String,
    /// Tag filter the metric was scoped to.
    pub scope: String,
    /// Display unit, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Human-friendly name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Tags that make up the scope.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// The analyzer's conclusion.
    #[serde(flatten)]
    pub outcome: SeriesOutcome,
}

impl SeriesReport {
    /// Creates a report entry for `series` with the given outcome.
    #[must_use]
    pub fn new(series: &Series, outcome: SeriesOutcome) -> Self {
        Self {
            id: series.id.clone(),
            metric: series.metric.clone(),
            scope: series.scope.clone(),
            unit: series.unit.clone(),
            display_name: series.display_name.clone(),
            tags: series.tags.clone(),
            outcome,
        }
    }

    /// Returns the statistics, if the series was analyzed.
    #[must_use]
    pub const fn statistics(&self) -> Option<&Statistics> {
        match &self.outcome {
            SeriesOutcome::Analyzed { statistics, .. } => Some(statistics),
            SeriesOutcome::NoData => None,
        }
    }

    /// Returns the anomaly judgment, if the series was analyzed.
    #[must_use]
    pub const fn anomaly(&self) -> Option<&Anomaly> {
        match &self.outcome {
            SeriesOutcome::Analyzed { anomaly, .. } => Some(anomaly),
            SeriesOutcome::NoData => None,
        }
    }

    /// Returns the severity, if the series was flagged.
    #[must_use]
    pub fn severity(&self) -> Option<Severity> {
        self.anomaly().and_then(|a| a.severity)
    }

    /// Returns true if the backend returned no samples for this series.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self.outcome, SeriesOutcome::NoData)
    }
}

/// Aggregate counts over a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Every series in the input batch, valid or not.
    pub total_series: usize,
    /// Series with samples that were analyzed.
    pub analyzed: usize,
    /// Series with no samples.
    pub no_data: usize,
    /// Series that failed validation.
    pub invalid: usize,
    /// Analyzed series flagged at any severity.
    pub anomalies: usize,
    /// Series flagged CRITICAL.
    pub critical: usize,
    /// Series flagged HIGH.
    pub high: usize,
    /// Series flagged MEDIUM.
    pub medium: usize,
    /// Most severe flag in the batch.
    pub highest_severity: Option<Severity>,
}

impl Summary {
    fn tally(entries: &[SeriesReport], invalid: usize) -> Self {
        let mut summary = Self {
            total_series: entries.len() + invalid,
            invalid,
            ..Self::default()
        };

        for entry in entries {
            match &entry.outcome {
                SeriesOutcome::NoData => summary.no_data += 1,
                SeriesOutcome::Analyzed { anomaly, .. } => {
                    summary.analyzed += 1;
                    if let Some(severity) = anomaly.severity {
                        summary.anomalies += 1;
                        match severity {
                            Severity::Critical => summary.critical += 1,
                            Severity::High => summary.high += 1,
                            Severity::Medium => summary.medium += 1,
                        }
                        summary.highest_severity = summary.highest_severity.max(Some(severity));
                    }
                }
            }
        }

        summary
    }

    /// Returns the number of series flagged at exactly `severity`.
    #[must_use]
    pub const fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
        }
    }
}

/// Result of analyzing one batch of series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Thresholds the batch was judged against.
    pub thresholds: Thresholds,
    /// Analyzed and no-data series, in input order.
    pub entries: Vec<SeriesReport>,
    /// Series that failed validation, in input order.
    pub invalid: Vec<ValidationError>,
    /// Aggregate counts.
    pub summary: Summary,
    /// Suggested follow-ups, most urgent first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

impl AnalysisReport {
    /// Assembles a report and computes its summary.
    #[must_use]
    pub fn new(
        thresholds: Thresholds,
        entries: Vec<SeriesReport>,
        invalid: Vec<ValidationError>,
    ) -> Self {
        let summary = Summary::tally(&entries, invalid.len());
        Self {
            thresholds,
            entries,
            invalid,
            summary,
            recommendations: Vec::new(),
        }
    }

    /// Attaches recommendations derived from the entries.
    #[must_use]
    pub fn with_recommendations(mut self) -> Self {
        self.recommendations = recommend(&self.entries, &self.invalid);
        self
    }

    /// Returns the flagged entries, most severe first, input order within a severity.
    #[must_use]
    pub fn anomalies(&self) -> Vec<&SeriesReport> {
        let mut flagged: Vec<&SeriesReport> = self
            .entries
            .iter()
            .filter(|e| e.severity().is_some())
            .collect();
        flagged.sort_by(|a, b| b.severity().cmp(&a.severity()));
        flagged
    }

    /// Returns the number of entries flagged at exactly `severity`.
    #[must_use]
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.summary.count(severity)
    }

    /// Returns true if any entry was flagged at `severity` or above.
    #[must_use]
    pub fn has_severity_at_least(&self, severity: Severity) -> bool {
        self.summary
            .highest_severity
            .is_some_and(|highest| highest >= severity)
    }

    /// Returns true if anything in the batch needs an operator's attention.
    #[must_use]
    pub const fn requires_attention(&self) -> bool {
        self.summary.anomalies > 0 || self.summary.invalid > 0
    }
}

fn recommend(entries: &[SeriesReport], invalid: &[ValidationError]) -> Vec<String> {
    let mut out = Vec::new();

    for severity in Severity::DESCENDING {
        for entry in entries.iter().filter(|e| e.severity() == Some(severity)) {
            let reason = entry.anomaly().map_or("", |a| a.reason.as_str());
            let line = match severity {
                Severity::Critical => format!(
                    "Investigate {} first: {reason}. \
                     Check recent deploys and dependencies for this scope.",
                    entry.id
                ),
                Severity::High => format!(
                    "Review {}: {reason}. Correlate with the incident start time.",
                    entry.id
                ),
                Severity::Medium => format!("Keep an eye on {}: {reason}.", entry.id),
            };
            out.push(line);
        }
    }

    for entry in entries.iter().filter(|e| e.is_no_data()) {
        out.push(format!(
            "Confirm {} is still reporting; the query window returned no samples.",
            entry.id
        ));
    }

    for error in invalid {
        out.push(format!(
            "Fix the upstream data for '{}' before relying on it: {}.",
            error.series, error.reason
        ));
    }

    if out.is_empty() && !entries.is_empty() {
        out.push(
            "All analyzed series are within baseline; these metrics show no incident signal."
                .to_string(),
        );
    }

    out
}
