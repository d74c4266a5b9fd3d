//! Report aggregation
//!
//! Groups finalized per-job CPU-time by (user, group, queue set) and by
//! group. Keys are ordered so the tables print deterministically.

use crate::analyzer::Aggregation;
use crate::models::{GroupUsage, JobOutput, ProcessingStats, UserUsage};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub by_user: bool,
    pub by_group: bool,
    pub verbose: bool,
    pub debug_multiqueue: bool,
}

type UserKey = (Option<String>, Option<String>, BTreeSet<String>);

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(rename = "totalCpuTime")]
    pub total_cpu_time: i64,
    #[serde(rename = "byUser", skip_serializing_if = "Option::is_none")]
    pub by_user: Option<Vec<UserUsage>>,
    #[serde(rename = "byGroup", skip_serializing_if = "Option::is_none")]
    pub by_group: Option<Vec<GroupUsage>>,
    /// Per-job dump, every job when verbose, multi-queue jobs otherwise.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<JobOutput>,
    pub stats: ProcessingStats,
}

impl Report {
    pub fn build(aggregation: &Aggregation, options: ReportOptions) -> Self {
        let mut user_stat: BTreeMap<UserKey, i64> = BTreeMap::new();
        let mut group_stat: BTreeMap<Option<String>, i64> = BTreeMap::new();
        let mut jobs = Vec::new();

        for job in &aggregation.jobs {
            if options.verbose || (options.debug_multiqueue && job.queues.len() > 1) {
                jobs.push(job.to_output());
            }
            if options.by_user {
                let key = (job.user.clone(), job.group.clone(), aggregation.queue_key(job));
                let total = user_stat.entry(key).or_insert(0);
                *total = total.saturating_add(job.cpu_time);
            }
            if options.by_group {
                let total = group_stat.entry(job.group.clone()).or_insert(0);
                *total = total.saturating_add(job.cpu_time);
            }
        }

        let by_user = options.by_user.then(|| {
            user_stat
                .into_iter()
                .map(|((user, group, queues), cpu_time)| UserUsage {
                    user,
                    group,
                    queues: queues.into_iter().collect(),
                    cpu_time,
                })
                .collect()
        });
        let by_group = options.by_group.then(|| {
            group_stat
                .into_iter()
                .map(|(group, cpu_time)| GroupUsage { group, cpu_time })
                .collect()
        });

        Self {
            total_cpu_time: aggregation.total_cpu_time(),
            by_user,
            by_group,
            jobs,
            stats: aggregation.stats.clone(),
        }
    }
}
