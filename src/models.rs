//! Core Data Models
//!
//! This module defines the data structures shared by the parser, the per-job
//! state machine and the reporting layer.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`AccountingEvent`] - one lifecycle record parsed from an accounting log line
//! 2. **Per-job state**: [`crate::job_state::JobState`] - CPU-time reconstructed from a job's events
//! 3. **Output**: [`UserUsage`], [`GroupUsage`] - serializable report rows
//!
//! ## Core Types
//!
//! - [`EventKind`] - the four lifecycle record types (`S`, `R`, `D`, `E`)
//! - [`JobPhase`] - the lifecycle state a job has reached
//! - [`ReportWindow`] - the UTC time range covered by a run
//! - [`ProcessingStats`] - counters collected while ingesting files

use crate::timestamp_parser::TimestampParser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Lifecycle record type carried in the second field of an accounting line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Start,
    Running,
    Deleted,
    Exit,
}

impl EventKind {
    /// Map a record type character to a lifecycle kind. Any other record
    /// type (queued, aborted, license...) is not tracked.
    pub fn from_record_char(c: char) -> Option<Self> {
        match c {
            'S' => Some(EventKind::Start),
            'R' => Some(EventKind::Running),
            'D' => Some(EventKind::Deleted),
            'E' => Some(EventKind::Exit),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            EventKind::Start => 'S',
            EventKind::Running => 'R',
            EventKind::Deleted => 'D',
            EventKind::Exit => 'E',
        }
    }
}

/// One Start/Running/Deleted/Exit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingEvent {
    /// Seconds since the epoch, UTC.
    pub timestamp: i64,
    pub kind: EventKind,
    pub job_id: i64,
    pub user: Option<String>,
    pub group: Option<String>,
    pub queue: Option<String>,
    /// `Resource_List.ncpus`, `None` when the record does not carry it.
    pub ncpus: Option<i64>,
}

impl AccountingEvent {
    pub fn new(timestamp: i64, kind: EventKind, job_id: i64) -> Self {
        Self {
            timestamp,
            kind,
            job_id,
            user: None,
            group: None,
            queue: None,
            ncpus: None,
        }
    }

    /// Exit record used to close jobs still open at the end of the window.
    pub fn synthetic_exit(timestamp: i64) -> Self {
        Self::new(timestamp, EventKind::Exit, -1)
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn with_ncpus(mut self, ncpus: i64) -> Self {
        self.ncpus = Some(ncpus);
        self
    }

    pub fn ncpus_or_default(&self) -> i64 {
        self.ncpus.unwrap_or(0)
    }
}

impl fmt::Display for AccountingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} u={} g={} q={} ncpus={}",
            TimestampParser::format_epoch(self.timestamp),
            self.kind.as_char(),
            self.job_id,
            display_opt(&self.user),
            display_opt(&self.group),
            display_opt(&self.queue),
            self.ncpus_or_default(),
        )
    }
}

/// Lifecycle state reached by a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobPhase {
    Initial,
    Start,
    Running,
    Deleted,
    Exit,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Deleted | JobPhase::Exit)
    }

    pub fn as_char(self) -> char {
        match self {
            JobPhase::Initial => '0',
            JobPhase::Start => 'S',
            JobPhase::Running => 'R',
            JobPhase::Deleted => 'D',
            JobPhase::Exit => 'E',
        }
    }
}

impl From<EventKind> for JobPhase {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Start => JobPhase::Start,
            EventKind::Running => JobPhase::Running,
            EventKind::Deleted => JobPhase::Deleted,
            EventKind::Exit => JobPhase::Exit,
        }
    }
}

/// Inclusive UTC range `[start, end]` in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub start: i64,
    pub end: i64,
}

impl ReportWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
}

/// Allow-lists applied to events before they reach a job.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub users: BTreeSet<String>,
    pub groups: BTreeSet<String>,
    pub queues: BTreeSet<String>,
}

impl Filters {
    pub fn new<I, S>(users: I, groups: I, queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
            groups: groups.into_iter().map(Into::into).collect(),
            queues: queues.into_iter().map(Into::into).collect(),
        }
    }

    /// An event is dropped when one of its fields is present and excluded by
    /// a non-empty allow-list. Absent fields never exclude.
    pub fn admits(&self, event: &AccountingEvent) -> bool {
        allowed(&self.users, event.user.as_deref())
            && allowed(&self.groups, event.group.as_deref())
            && allowed(&self.queues, event.queue.as_deref())
    }
}

fn allowed(list: &BTreeSet<String>, value: Option<&str>) -> bool {
    match value {
        Some(v) if !list.is_empty() => list.contains(v),
        _ => true,
    }
}

/// Counters collected by the analyzer over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingStats {
    #[serde(rename = "filesRead")]
    pub files_read: usize,
    #[serde(rename = "filesMissing")]
    pub files_missing: usize,
    #[serde(rename = "linesRead")]
    pub lines_read: usize,
    #[serde(rename = "eventsApplied")]
    pub events_applied: usize,
    #[serde(rename = "eventsFiltered")]
    pub events_filtered: usize,
    #[serde(rename = "linesIgnored")]
    pub lines_ignored: usize,
    #[serde(rename = "parseErrors")]
    pub parse_errors: usize,
    #[serde(rename = "stateErrors")]
    pub state_errors: usize,
    #[serde(rename = "jobsFinalized")]
    pub jobs_finalized: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserUsage {
    pub user: Option<String>,
    pub group: Option<String>,
    pub queues: Vec<String>,
    #[serde(rename = "cpuTime")]
    pub cpu_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupUsage {
    pub group: Option<String>,
    #[serde(rename = "cpuTime")]
    pub cpu_time: i64,
}

/// Job summary row used by the verbose and multi-queue dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutput {
    #[serde(rename = "jobId")]
    pub job_id: i64,
    pub state: JobPhase,
    pub user: Option<String>,
    pub group: Option<String>,
    #[serde(rename = "cpuTime")]
    pub cpu_time: i64,
    pub queues: Vec<String>,
    #[serde(rename = "hasOrphan")]
    pub has_orphan: bool,
}

pub(crate) fn display_opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("None")
}
