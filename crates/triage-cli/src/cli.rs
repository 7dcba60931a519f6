//! Command-line argument parsing with clap.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use triage_analyzer::Severity;

/// Triage CLI - metric anomaly analysis for incident response.
#[derive(Parser, Debug, Clone)]
#[command(name = "triage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, global = true, default_value_t = Format::Table)]
    pub format: Format,

    /// Log analysis decisions to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Analyze a metrics document and report anomalies.
    Analyze(AnalyzeArgs),

    /// Print the effective severity thresholds.
    Thresholds(ThresholdArgs),
}

/// Threshold and configuration options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ThresholdArgs {
    /// JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Percentage deviation at which an anomaly is HIGH.
    #[arg(long, value_name = "PCT", env = "TRIAGE_DEVIATION_THRESHOLD")]
    pub deviation_threshold: Option<f64>,

    /// Percentage deviation at which an anomaly is CRITICAL.
    #[arg(long, value_name = "PCT", env = "TRIAGE_CRITICAL_THRESHOLD")]
    pub critical_threshold: Option<f64>,

    /// Percentage deviation at which an anomaly is MEDIUM.
    #[arg(long, value_name = "PCT", env = "TRIAGE_MEDIUM_THRESHOLD")]
    pub medium_threshold: Option<f64>,
}

/// Arguments for the analyze command.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Metrics document to read; `-` or omitted reads stdin.
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Threshold overrides.
    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    /// Leave recommendations out of the report.
    #[arg(long)]
    pub no_recommendations: bool,

    /// Write the report to a file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exit with status 2 when an anomaly at or above this severity is found.
    #[arg(long, value_enum, value_name = "SEVERITY")]
    pub fail_on: Option<SeverityArg>,
}

impl AnalyzeArgs {
    /// Returns the input path, or `None` when the document comes from stdin.
    #[must_use]
    pub fn input_path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|path| path.as_os_str() != "-")
    }
}

/// Severity levels accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    /// MEDIUM and above.
    Medium,
    /// HIGH and above.
    High,
    /// CRITICAL only.
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Medium => Self::Medium,
            SeverityArg::High => Self::High,
            SeverityArg::Critical => Self::Critical,
        }
    }
}
