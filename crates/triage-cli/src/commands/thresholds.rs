//! Thresholds command implementation.

use std::io::Write;

use triage_analyzer::{AnalyzerConfig, Thresholds};

use crate::cli::ThresholdArgs;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Thresholds command executor.
#[derive(Debug)]
pub struct ThresholdsCommand {
    config: AnalyzerConfig,
}

impl ThresholdsCommand {
    /// Create a thresholds command for the given configuration.
    #[must_use]
    pub const fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Create a thresholds command from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn from_args(args: &ThresholdArgs) -> Result<Self, CliError> {
        Ok(Self::new(super::load_config(args)?))
    }

    /// Resolve and validate the thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if the thresholds are invalid.
    pub fn resolve(&self) -> Result<Thresholds, CliError> {
        Ok(self.config.thresholds.resolve()?)
    }

    /// Execute the thresholds command.
    ///
    /// # Errors
    ///
    /// Returns an error if the thresholds are invalid or output fails.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let thresholds = self.resolve()?;
        format.write(writer, &thresholds)?;
        Ok(())
    }
}
