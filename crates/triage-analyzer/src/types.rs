//! Core types for the metrics analyzer.
//!
//! This module defines the data model shared by ingestion, analysis and
//! reporting:
//! - [`Sample`]: a single timestamped measurement
//! - [`SeriesId`]: a validated series identifier
//! - [`Series`]: a named, scoped sequence of samples for one query window
//! - [`Severity`]: how far a series has drifted from its baseline
//! - [`Direction`]: which way the latest value moved relative to the average

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A single measurement: Unix timestamp in milliseconds and a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    /// The measured value.
    pub value: f64,
}

impl Sample {
    /// Creates a new sample.
    #[must_use]
    pub const fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<(i64, f64)> for Sample {
    fn from((timestamp, value): (i64, f64)) -> Self {
        Self::new(timestamp, value)
    }
}

/// A validated series identifier.
///
/// Identifiers are the keys of the input mapping, usually the metric name
/// followed by its scope (`system.cpu.user{service:api-gateway}`). They must
/// contain at least one non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(String);

impl SeriesId {
    /// Creates a new identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the identifier is empty or blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::new(id, 0, "series identifier cannot be empty"));
        }
        Ok(Self(id))
    }

    /// Builds the conventional `metric{scope}` identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the metric name is blank.
    pub fn from_metric_scope(metric: &str, scope: &str) -> Result<Self, ValidationError> {
        if scope.is_empty() {
            Self::new(metric)
        } else if metric.trim().is_empty() {
            Err(ValidationError::new(
                format!("{metric}{{{scope}}}"),
                0,
                "metric name cannot be empty",
            ))
        } else {
            Self::new(format!("{metric}{{{scope}}}"))
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SeriesId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A named, tagged sequence of samples over one query window.
///
/// A series with no samples is valid: it means the backend returned nothing
/// for the window, and is reported as "no data" rather than analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Identifier of this series within its batch.
    pub id: SeriesId,
    /// Metric name, e.g. `system.cpu.user`.
    pub metric: String,
    /// Tag filter the metric was scoped to, e.g. `service:api-gateway`.
    pub scope: String,
    /// Display unit, if the backend reported one.
    pub unit: Option<String>,
    /// Human-friendly name, if the backend reported one.
    pub display_name: Option<String>,
    /// Individual tags that make up the scope.
    pub tags: Vec<String>,
    /// Samples in the order they were received.
    pub samples: Vec<Sample>,
}

impl Series {
    /// Creates a new series with an empty scope.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if any sample value is NaN or infinite.
    pub fn new(
        id: SeriesId,
        metric: impl Into<String>,
        samples: Vec<Sample>,
    ) -> Result<Self, ValidationError> {
        if let Some(index) = samples.iter().position(|s| !s.value.is_finite()) {
            return Err(ValidationError::new(
                id.as_str(),
                0,
                format!("sample {index} has a non-finite value"),
            ));
        }

        Ok(Self {
            id,
            metric: metric.into(),
            scope: String::new(),
            unit: None,
            display_name: None,
            tags: Vec::new(),
            samples,
        })
    }

    /// Creates a series with no samples.
    #[must_use]
    pub fn empty(id: SeriesId, metric: impl Into<String>) -> Self {
        Self {
            id,
            metric: metric.into(),
            scope: String::new(),
            unit: None,
            display_name: None,
            tags: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Sets the scope of this series.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the display unit.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Returns true if the backend returned no samples for this series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Severity of an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Noticeable drift, worth a look.
    Medium,
    /// Drift beyond the main deviation threshold.
    High,
    /// Drift beyond the critical threshold, or departure from a zero baseline.
    Critical,
}

impl Severity {
    /// All severities, most severe first.
    pub const DESCENDING: [Self; 3] = [Self::Critical, Self::High, Self::Medium];

    /// Returns the severity as a numeric value for comparison.
    #[must_use]
    pub const fn as_level(&self) -> u8 {
        match self {
            Self::Medium => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!(
                "unknown severity '{other}' (expected medium, high or critical)"
            )),
        }
    }
}

/// Direction of the latest value relative to the window average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Latest value is above the average.
    Increase,
    /// Latest value is below the average.
    Decrease,
    /// Latest value equals the average.
    Unchanged,
}

impl Direction {
    /// Determines the direction of `latest` relative to `baseline`.
    #[must_use]
    pub fn between(baseline: f64, latest: f64) -> Self {
        if latest > baseline {
            Self::Increase
        } else if latest < baseline {
            Self::Decrease
        } else {
            Self::Unchanged
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increase => write!(f, "increase"),
            Self::Decrease => write!(f, "decrease"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}
