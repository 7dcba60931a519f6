//! # triage-analyzer
//!
//! Metrics analysis for incident triage.
//!
//! This crate takes time series that have already been fetched from a
//! monitoring backend and attaches meaning to them: summary statistics per
//! series, a judgment of how far the latest value has drifted from the
//! window average, and a severity for that drift. The result is a structured
//! [`AnalysisReport`] that a renderer or an operator can act on.
//!
//! The pipeline is three independent stages connected by plain data:
//!
//! ```text
//! JSON document ──► ingest::parse_document ──► SeriesBatch
//!                                                  │
//!                          Analyzer::analyze ◄─────┘
//!                                  │
//!                                  ▼
//!                           AnalysisReport (serde)
//! ```
//!
//! ## Features
//!
//! - **Pure analysis**: no I/O, no clock, no shared state; same input, same report
//! - **Per-series isolation**: a malformed series is reported, not fatal
//! - **Explicit edge cases**: empty series are "no data", zero averages are handled
//!
//! ## Quick Start
//!
//! ```rust
//! use triage_analyzer::{Analyzer, Sample, Series, SeriesBatch, SeriesId, Severity};
//!
//! let id = SeriesId::new("trace.http.request.hits{service:api-gateway}").unwrap();
//! let samples = vec![
//!     Sample::new(1_700_000_000_000, 100.0),
//!     Sample::new(1_700_000_060_000, 100.0),
//!     Sample::new(1_700_000_120_000, 250.0),
//! ];
//! let series = Series::new(id, "trace.http.request.hits", samples)
//!     .unwrap()
//!     .with_scope("service:api-gateway");
//!
//! let batch: SeriesBatch = std::iter::once(series).collect();
//! let report = Analyzer::new().analyze(&batch);
//!
//! assert_eq!(report.summary.high, 1);
//! assert_eq!(report.entries[0].severity(), Some(Severity::High));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analyzer;
pub mod config;
pub mod detector;
pub mod error;
pub mod ingest;
pub mod report;
pub mod stats;
pub mod types;

pub use analyzer::{analyze, Analyzer};
pub use config::{AnalyzerConfig, ThresholdConfig, Thresholds};
pub use detector::{assess, classify, Anomaly, Deviation};
pub use error::{AnalysisError, Result, ValidationError};
pub use ingest::{parse_document, BatchEntry, SeriesBatch};
pub use report::{AnalysisReport, SeriesOutcome, SeriesReport, Summary};
pub use stats::Statistics;
pub use types::{Direction, Sample, Series, SeriesId, Severity};
