//! Accounting record parser
//!
//! Turns one line of a PBS accounting log into an [`AccountingEvent`].
//! A record looks like
//!
//! ```text
//! 01/02/2024 10:00:00;S;123.server;user=alice group=g1 queue=q1 Resource_List.ncpus=4
//! ```
//!
//! Only the four lifecycle record types (`S`, `R`, `D`, `E`) become events.
//! Other record types are recognised by their timestamp prefix and skipped
//! without error.

use crate::error::ParseError;
use crate::models::{AccountingEvent, EventKind};
use crate::timestamp_parser::TimestampParser;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

static IGNORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2};[^SRDE]").expect("valid ignore pattern")
});

static RECORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<date>\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2});(?P<type>.);(?P<jobid>-?\d+)\.[^;]*;(?P<attr>.*)$",
    )
    .expect("valid record pattern")
});

const NCPUS_KEY: &str = "Resource_List.ncpus";

/// Outcome of parsing one numbered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub line_number: usize,
    pub outcome: Result<Option<AccountingEvent>, ParseError>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RecordParser;

impl RecordParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a single accounting line.
    ///
    /// Returns `Ok(None)` for blank lines and for records whose type is not
    /// one of `S`, `R`, `D`, `E`.
    pub fn parse_line(&self, raw: &str) -> Result<Option<AccountingEvent>, ParseError> {
        let line = raw.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || IGNORE_RE.is_match(line) {
            return Ok(None);
        }

        let caps = RECORD_RE.captures(line).ok_or_else(|| ParseError::Malformed {
            line: line.to_string(),
        })?;

        let date = &caps["date"];
        let timestamp =
            TimestampParser::parse_record(date).ok_or_else(|| ParseError::InvalidTimestamp {
                timestamp: date.to_string(),
                line: line.to_string(),
            })?;

        let kind = caps["type"]
            .chars()
            .next()
            .and_then(EventKind::from_record_char)
            .ok_or_else(|| ParseError::Malformed {
                line: line.to_string(),
            })?;

        let job_id = caps["jobid"].parse::<i64>().map_err(|_| ParseError::Malformed {
            line: line.to_string(),
        })?;

        let mut event = AccountingEvent::new(timestamp, kind, job_id);
        for (key, value) in attributes(&caps["attr"]) {
            match key {
                "user" => event.user = Some(value.to_string()),
                "group" => event.group = Some(value.to_string()),
                "queue" => event.queue = Some(value.to_string()),
                NCPUS_KEY => {
                    let ncpus = value.parse::<i64>().map_err(|_| ParseError::InvalidNcpus {
                        value: value.to_string(),
                        line: line.to_string(),
                    })?;
                    event.ncpus = Some(ncpus);
                }
                _ => {}
            }
        }

        Ok(Some(event))
    }

    /// Parse every line of a reader, keeping line numbers (1-based).
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<Vec<ParsedLine>> {
        let mut parsed = Vec::new();
        for (idx, chunk) in reader.split(b'\n').enumerate() {
            let bytes = chunk.context("Failed to read accounting line")?;
            let line = String::from_utf8_lossy(&bytes);
            parsed.push(ParsedLine {
                line_number: idx + 1,
                outcome: self.parse_line(&line),
            });
        }
        Ok(parsed)
    }

    /// Parse a whole accounting file.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<ParsedLine>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open accounting file: {}", path.display()))?;
        self.parse_reader(BufReader::new(file))
            .with_context(|| format!("Failed to read accounting file: {}", path.display()))
    }
}

/// `key=value` tokens of the attribute field. Tokens without `=`, with an
/// empty key or an empty value are skipped.
fn attributes(field: &str) -> impl Iterator<Item = (&str, &str)> {
    field.split_whitespace().filter_map(|token| {
        let (key, value) = token.split_once('=')?;
        if key.is_empty() || value.is_empty() {
            None
        } else {
            Some((key, value))
        }
    })
}

/// Convenience wrapper around [`RecordParser::parse_line`].
pub fn parse_line(line: &str) -> Result<Option<AccountingEvent>, ParseError> {
    RecordParser::new().parse_line(line)
}
