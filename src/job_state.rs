//! Per-job lifecycle state machine
//!
//! A [`JobState`] consumes the Start/Running/Deleted/Exit events of one job
//! id in log order and reconstructs the CPU-time the job consumed:
//! `ncpus * elapsed seconds`, summed over every interval that opens with a
//! Start (or a Running checkpoint) and closes with the next Running, Deleted
//! or Exit record.
//!
//! Jobs first seen mid-flight (no Start in the observed window) are
//! "orphans": their first closing record is charged from the window start,
//! later ones from the previous orphan record.

use crate::error::StateError;
use crate::models::{display_opt, AccountingEvent, EventKind, JobOutput, JobPhase};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct JobState {
    pub job_id: i64,
    pub state: JobPhase,
    pub cpu_time: i64,
    pub last_ncpus: i64,
    pub last_time: i64,
    pub has_orphan: bool,
    pub user: Option<String>,
    pub group: Option<String>,
    pub queues: BTreeSet<String>,
    history: Vec<AccountingEvent>,
}

/// What a single event does to the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Open a new interval at the event.
    Snapshot,
    /// Charge the open interval up to the event, then adopt its kind.
    Close,
    /// Charge the open interval and reopen it at the event.
    Checkpoint,
    /// Event before any Start: charge from the window start, state unchanged.
    Orphan,
    /// Terminal record repeated on a terminal job; adopt without charging.
    Repeat,
    Reject,
}

impl JobState {
    /// Create an empty job whose fallback baseline is `window_start`.
    pub fn new(job_id: i64, window_start: i64) -> Self {
        Self {
            job_id,
            state: JobPhase::Initial,
            cpu_time: 0,
            last_ncpus: 0,
            last_time: window_start,
            has_orphan: false,
            user: None,
            group: None,
            queues: BTreeSet::new(),
            history: Vec::new(),
        }
    }

    /// Events applied so far, in order.
    pub fn history(&self) -> &[AccountingEvent] {
        &self.history
    }

    /// Apply the next event of this job.
    ///
    /// Metadata is merged before the transition is checked, so a rejected
    /// event still contributes its user, group and queue. The event is
    /// recorded in the history either way.
    pub fn apply(&mut self, event: AccountingEvent) -> Result<(), StateError> {
        self.merge_metadata(&event);

        match Self::step(self.state, event.kind) {
            Step::Reject => {
                let err = self.rejection(&event);
                self.history.push(event);
                return Err(err);
            }
            Step::Snapshot => {
                if self.has_orphan {
                    warn!(
                        job_id = event.job_id,
                        "Orphan D/E/R record found for job, cpu time may be undercounted"
                    );
                }
                if self.state == JobPhase::Start {
                    warn!(
                        job_id = event.job_id,
                        last_start = self.last_time,
                        "Duplicate Start record, previous interval dropped"
                    );
                }
                self.last_ncpus = event.ncpus_or_default();
                self.last_time = event.timestamp;
                self.state = JobPhase::Start;
            }
            Step::Close => {
                let Some(cpu_time) = self.accrued(self.last_ncpus, event.timestamp) else {
                    return Err(self.overflow(event));
                };
                self.cpu_time = cpu_time;
                self.state = event.kind.into();
            }
            Step::Checkpoint => {
                let Some(cpu_time) = self.accrued(self.last_ncpus, event.timestamp) else {
                    return Err(self.overflow(event));
                };
                self.cpu_time = cpu_time;
                if let Some(ncpus) = event.ncpus {
                    self.last_ncpus = ncpus;
                }
                self.last_time = event.timestamp;
                self.state = JobPhase::Running;
            }
            Step::Orphan => {
                // Records without ncpus carry nothing to charge.
                if let Some(ncpus) = event.ncpus {
                    let Some(cpu_time) = self.accrued(ncpus, event.timestamp) else {
                        return Err(self.overflow(event));
                    };
                    self.cpu_time = cpu_time;
                }
                self.has_orphan = true;
                self.last_time = event.timestamp;
            }
            Step::Repeat => {
                self.state = event.kind.into();
            }
        }

        self.history.push(event);
        Ok(())
    }

    fn merge_metadata(&mut self, event: &AccountingEvent) {
        if let Some(user) = &event.user {
            self.user = Some(user.clone());
        }
        if let Some(group) = &event.group {
            self.group = Some(group.clone());
        }
        if let Some(queue) = &event.queue {
            self.queues.insert(queue.clone());
        }
    }

    fn step(state: JobPhase, kind: EventKind) -> Step {
        use EventKind as K;
        use JobPhase as P;

        match (state, kind) {
            (_, K::Start) => Step::Snapshot,
            (P::Initial, K::Running | K::Deleted | K::Exit) => Step::Orphan,
            (P::Start | P::Running, K::Running) => Step::Checkpoint,
            (P::Start | P::Running, K::Deleted | K::Exit) => Step::Close,
            (P::Deleted, K::Deleted | K::Exit) => Step::Repeat,
            (P::Exit, K::Deleted) => Step::Repeat,
            (P::Deleted | P::Exit, K::Running) => Step::Reject,
            (P::Exit, K::Exit) => Step::Reject,
        }
    }

    /// CPU-time after charging `ncpus` from `last_time` up to `timestamp`,
    /// `None` if it does not fit in an i64.
    fn accrued(&self, ncpus: i64, timestamp: i64) -> Option<i64> {
        timestamp
            .checked_sub(self.last_time)
            .and_then(|elapsed| ncpus.checked_mul(elapsed))
            .and_then(|charge| self.cpu_time.checked_add(charge))
    }

    /// Record `event` and build the error for a charge that overflowed.
    fn overflow(&mut self, event: AccountingEvent) -> StateError {
        let err = StateError::CpuTimeOverflow {
            job_id: self.job_id,
            summary: self.to_string(),
            rejected: event.to_string(),
        };
        self.history.push(event);
        err
    }

    fn rejection(&self, event: &AccountingEvent) -> StateError {
        let history = self
            .history
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        StateError::IllegalTransition {
            job_id: self.job_id,
            summary: self.to_string(),
            history,
            rejected: event.to_string(),
        }
    }

    /// Queue names with the router queues removed.
    pub fn queues_without(&self, ignored: &BTreeSet<String>) -> BTreeSet<String> {
        self.queues.difference(ignored).cloned().collect()
    }

    pub fn to_output(&self) -> JobOutput {
        JobOutput {
            job_id: self.job_id,
            state: self.state,
            user: self.user.clone(),
            group: self.group.clone(),
            cpu_time: self.cpu_time,
            queues: self.queues.iter().cloned().collect(),
            has_orphan: self.has_orphan,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queues = self.queues.iter().cloned().collect::<Vec<_>>().join(",");
        write!(
            f,
            "{} {:10} {:10} {:10}  {{{}}}",
            self.state.as_char(),
            display_opt(&self.user),
            display_opt(&self.group),
            self.cpu_time,
            queues
        )
    }
}
