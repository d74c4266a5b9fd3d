//! Error types for record parsing and job state transitions

use thiserror::Error;

/// A line that looks like an accounting record but does not follow the grammar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed accounting record: {line}")]
    Malformed { line: String },

    #[error("invalid timestamp {timestamp:?} in record: {line}")]
    InvalidTimestamp { timestamp: String, line: String },

    #[error("invalid Resource_List.ncpus {value:?} in record: {line}")]
    InvalidNcpus { value: String, line: String },
}

impl ParseError {
    /// The offending input line.
    pub fn line(&self) -> &str {
        match self {
            ParseError::Malformed { line }
            | ParseError::InvalidTimestamp { line, .. }
            | ParseError::InvalidNcpus { line, .. } => line,
        }
    }
}

/// An event sequence the job state machine refuses to accept.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("illegal transition for job {job_id}\nself: {summary}\nrec history:\n{history}\n{rejected}")]
    IllegalTransition {
        job_id: i64,
        summary: String,
        history: String,
        rejected: String,
    },

    #[error("cpu time overflow for job {job_id}\nself: {summary}\n{rejected}")]
    CpuTimeOverflow {
        job_id: i64,
        summary: String,
        rejected: String,
    },
}

impl StateError {
    pub fn job_id(&self) -> i64 {
        match self {
            StateError::IllegalTransition { job_id, .. }
            | StateError::CpuTimeOverflow { job_id, .. } => *job_id,
        }
    }
}

/// A date argument that matches none of the accepted shorthands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("not any format of yyyymmdd, yymmdd, mmdd, dd: {0:?}")]
    UnknownFormat(String),

    #[error("invalid calendar date: {0:?}")]
    InvalidDate(String),
}
