use crate::error::DateError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Format of the timestamp field of accounting records.
pub const RECORD_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Handles the timestamp formats used by accounting logs and the CLI
pub struct TimestampParser;

impl TimestampParser {
    /// Parse a record timestamp (`MM/DD/YYYY HH:MM:SS`, UTC) into epoch seconds
    pub fn parse_record(timestamp_str: &str) -> Option<i64> {
        NaiveDateTime::parse_from_str(timestamp_str, RECORD_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc().timestamp())
    }

    /// Render epoch seconds back into a human readable UTC timestamp
    pub fn format_epoch(epoch: i64) -> String {
        match DateTime::<Utc>::from_timestamp(epoch, 0) {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => epoch.to_string(),
        }
    }

    /// Resolve a CLI date shorthand against `now`.
    ///
    /// Accepted lengths: 8 (`YYYYMMDD`), 6 (`YYMMDD`, century 20),
    /// 4 (`MMDD`, current year), 2 (`DD`, current year and month) and
    /// 0 (today).
    pub fn parse_date_arg(arg: Option<&str>, now: DateTime<Utc>) -> Result<NaiveDate, DateError> {
        let s = arg.unwrap_or("").trim();
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(DateError::UnknownFormat(s.to_string()));
        }
        let full = match s.len() {
            8 => s.to_string(),
            6 => format!("20{}", s),
            4 => format!("{:04}{}", now.year(), s),
            2 => format!("{:04}{:02}{}", now.year(), now.month(), s),
            0 => format!("{:04}{:02}{:02}", now.year(), now.month(), now.day()),
            _ => return Err(DateError::UnknownFormat(s.to_string())),
        };
        NaiveDate::parse_from_str(&full, "%Y%m%d").map_err(|_| DateError::InvalidDate(full))
    }

    /// Epoch seconds at 00:00:00 UTC of `date`
    pub fn start_of_day(date: NaiveDate) -> i64 {
        date.and_time(NaiveTime::MIN).and_utc().timestamp()
    }

    /// Epoch seconds at 23:59:59 UTC of `date`
    pub fn end_of_day(date: NaiveDate) -> i64 {
        let last_second = Duration::days(1) - Duration::seconds(1);
        (date.and_time(NaiveTime::MIN) + last_second).and_utc().timestamp()
    }
}
