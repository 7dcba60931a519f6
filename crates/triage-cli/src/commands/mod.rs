//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`analyze`] - Analyze a metrics document
//! - [`thresholds`] - Show the effective severity thresholds
//!
//! Both resolve their configuration the same way: defaults, then the
//! `--config` file, then flags (which clap has already merged with the
//! `TRIAGE_*` environment variables).

use std::fs;

use tracing::debug;
use triage_analyzer::AnalyzerConfig;

use crate::cli::ThresholdArgs;
use crate::error::CliError;

pub mod analyze;
pub mod thresholds;

pub use analyze::AnalyzeCommand;
pub use thresholds::ThresholdsCommand;

/// Build the analyzer configuration from a config file and flag overrides.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed. Threshold
/// ordering is not checked here.
pub fn load_config(args: &ThresholdArgs) -> Result<AnalyzerConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration file");
            let contents = fs::read_to_string(path).map_err(|source| CliError::File {
                path: path.clone(),
                source,
            })?;
            AnalyzerConfig::from_json_str(&contents).map_err(|source| CliError::Config {
                path: path.clone(),
                source,
            })?
        }
        None => AnalyzerConfig::default(),
    };

    if let Some(pct) = args.deviation_threshold {
        config.thresholds = config.thresholds.with_deviation(pct);
    }
    if let Some(pct) = args.critical_threshold {
        config.thresholds = config.thresholds.with_critical(pct);
    }
    if let Some(pct) = args.medium_threshold {
        config.thresholds = config.thresholds.with_medium(pct);
    }

    Ok(config)
}
