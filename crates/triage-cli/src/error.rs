//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;
use triage_analyzer::{AnalysisError, Severity};

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a file failed.
    #[error("cannot access {path}: {source}")]
    File {
        /// The file involved.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration file.
    #[error("configuration error in {path}: {source}")]
    Config {
        /// The configuration file.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: AnalysisError,
    },

    /// Analysis rejected its input.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// An anomaly at or above the `--fail-on` severity was found.
    #[error("found anomalies at or above {0}")]
    Threshold(Severity),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit status for this error: 2 for a tripped `--fail-on`, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Threshold(_) => 2,
            _ => 1,
        }
    }
}
