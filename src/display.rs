//! Output Formatting and Display Management
//!
//! Renders a [`Report`] either as the plain-text tables operators are used to
//! or as JSON for scripting.
//!
//! ## Text layout
//!
//! ```text
//!        123  E alice      phys              20  {work}
//! Total CPU Time is: 70
//! Total CPU Time per User:
//! alice         phys                    50 work
//! Total CPU Time per Group:
//! phys                    50
//! ```
//!
//! Job lines appear only for `--verbose` or `--debug-multiqueue`. Missing
//! users and groups are printed as `None`.

use crate::models::{display_opt, JobOutput};
use crate::report::Report;
use anyhow::{Context, Result};
use std::io::Write;

pub struct DisplayManager {
    json_output: bool,
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new(false)
    }
}

impl DisplayManager {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    pub fn render<W: Write>(&self, report: &Report, out: &mut W) -> Result<()> {
        if self.json_output {
            serde_json::to_writer_pretty(&mut *out, report).context("Failed to serialize report")?;
            writeln!(out)?;
            return Ok(());
        }

        for job in &report.jobs {
            writeln!(out, "{}", format_job_line(job))?;
        }

        writeln!(out, "Total CPU Time is: {}", report.total_cpu_time)?;

        if let Some(rows) = &report.by_user {
            writeln!(out, "Total CPU Time per User:")?;
            for row in rows {
                writeln!(
                    out,
                    "{:13} {:10} {:15} {}",
                    display_opt(&row.user),
                    display_opt(&row.group),
                    row.cpu_time,
                    row.queues.join(",")
                )?;
            }
        }

        if let Some(rows) = &report.by_group {
            writeln!(out, "Total CPU Time per Group:")?;
            for row in rows {
                writeln!(out, "{:10} {:15}", display_opt(&row.group), row.cpu_time)?;
            }
        }

        Ok(())
    }

    /// Render to stdout.
    pub fn display(&self, report: &Report) -> Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render(report, &mut handle)?;
        handle.flush().context("Failed to flush report")
    }
}

fn format_job_line(job: &JobOutput) -> String {
    format!(
        "{:10}  {} {:10} {:10} {:10}  {{{}}}",
        job.job_id,
        job.state.as_char(),
        display_opt(&job.user),
        display_opt(&job.group),
        job.cpu_time,
        job.queues.join(",")
    )
}
