//! Accounting Analysis Engine
//!
//! The [`AccountingAnalyzer`] is the aggregation driver: it owns every
//! [`JobState`] of a run, routes parsed events to them in file order and
//! closes the jobs still open when the input runs out.
//!
//! ## Processing Pipeline
//!
//! 1. **Parsing**: each line goes through [`RecordParser`]
//! 2. **Filtering**: user/group/queue allow-lists drop events before they reach a job
//! 3. **Routing**: events are applied to the job keyed by their job id, created lazily
//!    with the window start as baseline
//! 4. **Finalization**: jobs without a Deleted/Exit record get a synthetic Exit at the
//!    window end
//!
//! Parse errors and state machine violations are logged and counted; neither
//! stops the run.
//!
//! ## Usage Example
//!
//! ```rust
//! use pbs_cputime::analyzer::AccountingAnalyzer;
//! use pbs_cputime::models::{Filters, ReportWindow};
//! use std::collections::BTreeSet;
//!
//! let window = ReportWindow::new(1_704_153_600, 1_704_239_999);
//! let mut analyzer = AccountingAnalyzer::new(window, Filters::default());
//! analyzer.ingest_line("01/02/2024 10:00:00;S;1.srv;user=alice Resource_List.ncpus=2", "inline", 1);
//! analyzer.ingest_line("01/02/2024 10:10:00;E;1.srv;user=alice", "inline", 2);
//!
//! let aggregation = analyzer.finish(&BTreeSet::new());
//! assert_eq!(aggregation.total_cpu_time(), 1_200);
//! ```

use crate::error::ParseError;
use crate::job_state::JobState;
use crate::models::{AccountingEvent, Filters, ProcessingStats, ReportWindow};
use crate::parser::{ParsedLine, RecordParser};
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn};

pub struct AccountingAnalyzer {
    parser: RecordParser,
    window: ReportWindow,
    filters: Filters,
    jobs: Vec<JobState>,
    index: HashMap<i64, usize>,
    stats: ProcessingStats,
}

/// Finalized jobs of a run, in first-seen order.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub window: ReportWindow,
    pub jobs: Vec<JobState>,
    /// Router queues already excluded from [`Aggregation::queue_key`].
    pub router_queues: BTreeSet<String>,
    pub stats: ProcessingStats,
    index: HashMap<i64, usize>,
}

impl Aggregation {
    pub fn total_cpu_time(&self) -> i64 {
        self.jobs
            .iter()
            .fold(0_i64, |total, job| total.saturating_add(job.cpu_time))
    }

    pub fn job(&self, job_id: i64) -> Option<&JobState> {
        self.index.get(&job_id).map(|&slot| &self.jobs[slot])
    }

    /// Queue set of a job used as aggregation key, router queues removed.
    pub fn queue_key(&self, job: &JobState) -> BTreeSet<String> {
        job.queues_without(&self.router_queues)
    }

    /// Jobs that ran through more than one queue (before router queues are
    /// removed), usually a hint of job id reuse.
    pub fn multi_queue_jobs(&self) -> impl Iterator<Item = &JobState> {
        self.jobs.iter().filter(|job| job.queues.len() > 1)
    }
}

impl AccountingAnalyzer {
    pub fn new(window: ReportWindow, filters: Filters) -> Self {
        Self {
            parser: RecordParser::new(),
            window,
            filters,
            jobs: Vec::new(),
            index: HashMap::new(),
            stats: ProcessingStats::default(),
        }
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Parse and apply one line. `source` only labels log output.
    pub fn ingest_line(&mut self, line: &str, source: &str, line_number: usize) {
        let outcome = self.parser.parse_line(line);
        self.ingest_outcome(outcome, source, line_number);
    }

    fn ingest_outcome(
        &mut self,
        outcome: Result<Option<AccountingEvent>, ParseError>,
        source: &str,
        line_number: usize,
    ) {
        self.stats.lines_read += 1;
        match outcome {
            Ok(Some(event)) => self.ingest_event(event),
            Ok(None) => {
                trace!(source, line_number, "Skipping non-lifecycle record");
                self.stats.lines_ignored += 1;
            }
            Err(err) => {
                error!(source, line_number, error = %err, "Failed to parse accounting record");
                self.stats.parse_errors += 1;
            }
        }
    }

    /// Apply an already parsed event, honouring the allow-lists.
    pub fn ingest_event(&mut self, event: AccountingEvent) {
        if !self.filters.admits(&event) {
            self.stats.events_filtered += 1;
            return;
        }

        let job_id = event.job_id;
        let window_start = self.window.start;
        let slot = *self.index.entry(job_id).or_insert_with(|| {
            self.jobs.push(JobState::new(job_id, window_start));
            self.jobs.len() - 1
        });

        match self.jobs[slot].apply(event) {
            Ok(()) => self.stats.events_applied += 1,
            Err(err) => {
                error!(job_id, "{}", err);
                self.stats.state_errors += 1;
            }
        }
    }

    /// Process every line of a reader in order.
    pub fn ingest_reader<R: BufRead>(&mut self, reader: R, source: &str) -> Result<()> {
        for (idx, chunk) in reader.split(b'\n').enumerate() {
            let bytes = chunk.with_context(|| format!("Failed to read from {}", source))?;
            let line = String::from_utf8_lossy(&bytes);
            self.ingest_line(&line, source, idx + 1);
        }
        Ok(())
    }

    /// Process one daily file. A missing file is skipped.
    pub fn ingest_file(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            debug!(path = %path.display(), "Accounting file not found, skipping");
            self.stats.files_missing += 1;
            return Ok(());
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open accounting file: {}", path.display()))?;
        let source = path.display().to_string();
        self.ingest_reader(BufReader::new(file), &source)?;
        self.stats.files_read += 1;
        debug!(path = %source, jobs = self.jobs.len(), "Processed accounting file");
        Ok(())
    }

    /// Process files in the given order. Read failures are logged and the
    /// run moves on to the next file.
    #[cfg(not(feature = "parallel"))]
    pub fn ingest_files(&mut self, files: &[PathBuf]) {
        for path in files {
            if let Err(err) = self.ingest_file(path) {
                warn!(path = %path.display(), error = %err, "Skipping unreadable accounting file");
            }
        }
    }

    /// Parse files concurrently, then apply their events strictly in file
    /// order so each job still sees its records in log order.
    #[cfg(feature = "parallel")]
    pub fn ingest_files(&mut self, files: &[PathBuf]) {
        use rayon::prelude::*;

        let parser = self.parser;
        let parsed: Vec<Option<Result<Vec<ParsedLine>>>> = files
            .par_iter()
            .map(|path| path.is_file().then(|| parser.parse_file(path)))
            .collect();

        for (path, result) in files.iter().zip(parsed) {
            match result {
                None => {
                    debug!(path = %path.display(), "Accounting file not found, skipping");
                    self.stats.files_missing += 1;
                }
                Some(Ok(lines)) => {
                    self.ingest_parsed(lines, &path.display().to_string());
                    self.stats.files_read += 1;
                }
                Some(Err(err)) => {
                    warn!(path = %path.display(), error = %err, "Skipping unreadable accounting file");
                }
            }
        }
    }

    /// Apply lines produced by [`RecordParser::parse_reader`] or
    /// [`RecordParser::parse_file`].
    pub fn ingest_parsed(&mut self, lines: Vec<ParsedLine>, source: &str) {
        for parsed in lines {
            self.ingest_outcome(parsed.outcome, source, parsed.line_number);
        }
    }

    /// Close every job still open at the window end and hand out the result.
    pub fn finish(mut self, router_queues: &BTreeSet<String>) -> Aggregation {
        let window_end = self.window.end;
        for job in self.jobs.iter_mut().filter(|job| !job.state.is_terminal()) {
            if let Err(err) = job.apply(AccountingEvent::synthetic_exit(window_end)) {
                error!(job_id = job.job_id, "{}", err);
                self.stats.state_errors += 1;
                continue;
            }
            self.stats.jobs_finalized += 1;
        }

        info!(
            jobs = self.jobs.len(),
            files_read = self.stats.files_read,
            files_missing = self.stats.files_missing,
            events = self.stats.events_applied,
            filtered = self.stats.events_filtered,
            parse_errors = self.stats.parse_errors,
            state_errors = self.stats.state_errors,
            finalized = self.stats.jobs_finalized,
            "Accounting scan complete"
        );

        Aggregation {
            window: self.window,
            jobs: self.jobs,
            router_queues: router_queues.clone(),
            stats: self.stats,
            index: self.index,
        }
    }
}
