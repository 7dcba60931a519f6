//! # triage-cli
//!
//! Command-line front end for `triage-analyzer`.
//!
//! Provides commands for:
//! - Analyzing a metrics document and reporting anomalies
//! - Inspecting the effective severity thresholds
//!
//! # Architecture
//!
//! The CLI does not talk to a monitoring backend. It reads a document that an
//! upstream fetcher has already produced, from a file or stdin, and writes
//! the report to stdout or a file. Logs go to stderr.
//!
//! ```text
//! ┌──────────┐  metrics JSON   ┌────────────┐  report (table|json)
//! │ fetcher  │────────────────►│   triage   │────────────────────►
//! └──────────┘  (file/stdin)   └────────────┘      (stdout/file)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{AnalyzeArgs, Cli, Commands, Format, SeverityArg, ThresholdArgs};
pub use error::CliError;
pub use output::OutputFormat;
