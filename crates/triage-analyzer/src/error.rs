//! Error types for the triage-analyzer crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single series could not be analyzed because its input was malformed.
///
/// Validation errors are isolated to the series they describe: the rest of a
/// batch is still analyzed and the error is listed in the report next to the
/// successful entries.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invalid series '{series}' at position {position}: {reason}")]
pub struct ValidationError {
    /// Identifier of the offending series, as it appeared in the input.
    pub series: String,
    /// Zero-based position of the series in the input batch.
    pub position: usize,
    /// Why the series was rejected.
    pub reason: String,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(series: impl Into<String>, position: usize, reason: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            position,
            reason: reason.into(),
        }
    }

    /// Returns a copy of this error placed at a different batch position.
    #[must_use]
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }
}

/// Errors that fail an entire analysis call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The threshold configuration is unusable (negative, non-finite or mis-ordered).
    #[error("invalid configuration: {reason}")]
    Configuration {
        /// The reason the configuration was rejected.
        reason: String,
    },

    /// A series failed validation outside of batch analysis.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The input document itself could not be interpreted.
    #[error("malformed input document: {reason}")]
    Document {
        /// The reason the document was rejected.
        reason: String,
    },
}

impl AnalysisError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub(crate) fn document(reason: impl Into<String>) -> Self {
        Self::Document {
            reason: reason.into(),
        }
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
