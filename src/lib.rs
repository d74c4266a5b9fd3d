//! PBS CPU-time accounting
//!
//! Reads PBS scheduler accounting logs (one record per scheduling event) and
//! computes the CPU-time each job consumed, then aggregates it by user, group
//! and queue over a date range.
//!
//! ## Architecture Overview
//!
//! - [`parser`] - accounting line grammar, one line to one [`AccountingEvent`]
//! - [`job_state`] - per-job lifecycle state machine reconstructing CPU-time
//! - [`analyzer`] - aggregation driver: filters, routing by job id, finalization
//! - [`report`] - grouping of finalized jobs into report rows
//! - [`display`] - text and JSON rendering
//! - [`file_discovery`] - date range to daily accounting files
//! - [`timestamp_parser`] - record timestamps, CLI date shorthands, window bounds
//! - [`config`] - configuration with file and environment support
//! - [`logging`] - structured logging setup
//! - [`error`] - parse, state and date errors
//!
//! ## Example
//!
//! ```rust
//! use pbs_cputime::{AccountingAnalyzer, Filters, ReportWindow};
//! use std::collections::BTreeSet;
//!
//! let mut analyzer = AccountingAnalyzer::new(ReportWindow::new(0, 86_399), Filters::default());
//! analyzer.ingest_line("01/01/1970 01:00:00;S;7.srv;Resource_List.ncpus=4", "inline", 1);
//! analyzer.ingest_line("01/01/1970 01:01:00;E;7.srv;", "inline", 2);
//!
//! let aggregation = analyzer.finish(&BTreeSet::new());
//! assert_eq!(aggregation.total_cpu_time(), 240);
//! ```

pub mod analyzer;
pub mod config;
pub mod display;
pub mod error;
pub mod file_discovery;
pub mod job_state;
pub mod logging;
pub mod models;
pub mod parser;
pub mod report;
pub mod timestamp_parser;

pub use analyzer::{AccountingAnalyzer, Aggregation};
pub use error::{DateError, ParseError, StateError};
pub use job_state::JobState;
pub use models::*;
