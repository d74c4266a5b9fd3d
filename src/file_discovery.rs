use crate::models::ReportWindow;
use crate::timestamp_parser::TimestampParser;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Maps a date range onto the daily accounting files (`YYYYMMDD`) of a directory
pub struct FileDiscovery {
    accounting_dir: PathBuf,
}

impl FileDiscovery {
    pub fn new(accounting_dir: impl Into<PathBuf>) -> Self {
        Self {
            accounting_dir: accounting_dir.into(),
        }
    }

    pub fn accounting_dir(&self) -> &Path {
        &self.accounting_dir
    }

    /// One path per day from `start` to `end` inclusive, in date order.
    /// Files are not checked for existence; missing days are skipped at read time.
    pub fn daily_files(&self, start: NaiveDate, end: NaiveDate) -> Vec<PathBuf> {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .map(|day| self.accounting_dir.join(day.format("%Y%m%d").to_string()))
            .collect()
    }
}

/// Window covering `start` 00:00:00 to `end` 23:59:59 UTC.
pub fn report_window(start: NaiveDate, end: NaiveDate) -> ReportWindow {
    ReportWindow::new(TimestampParser::start_of_day(start), TimestampParser::end_of_day(end))
}
