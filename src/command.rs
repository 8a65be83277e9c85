//! Query command parsing and validation
//!
//! Implements the REPL grammar as a small hand-written parser producing a
//! typed command, with the IP octet and date-time bounds kept as explicit
//! range checks:
//!
//! ```text
//! QUERY <ipv4> <cpu_id:0|1> <YYYY-MM-DD HH:MM> <YYYY-MM-DD HH:MM>
//! EXIT
//! ```
//!
//! The `QUERY` keyword is case-sensitive; `EXIT` is not. Semantic time-range
//! validation clamps or rejects against the recorded bounds.

use std::net::Ipv4Addr;

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{ServerKey, TimeBounds};

/// Re-prompt hint printed after every rejected command
pub const COMMAND_FORMAT: &str =
    "Command format: QUERY IP CPU_ID YYYY-MM-DD HH:MM YYYY-MM-DD HH:MM";

/// A parsed REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A usage query
    Query(CpuQuery),
    /// Terminate the REPL loop
    Exit,
}

/// A validated usage query, before range clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuQuery {
    /// Series to query
    pub key: ServerKey,
    /// Requested start time (unix seconds, inclusive)
    pub start: i64,
    /// Requested end time (unix seconds, exclusive)
    pub end: i64,
}

/// A query time range clamped to the recorded bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampedRange {
    /// Clamped start time (inclusive)
    pub start: i64,
    /// Clamped end time (exclusive)
    pub end: i64,
}

/// Recoverable, user-facing command errors
///
/// These are reported at the REPL boundary and abort only the current query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command does not match the grammar
    #[error("Invalid input: {0}")]
    Syntax(String),

    /// start >= end
    #[error("start must precede end")]
    StartNotBeforeEnd,

    /// start is later than the last recorded minute
    #[error("start beyond recorded range")]
    StartBeyondRecorded,

    /// end is earlier than the first recorded minute
    #[error("end before recorded range")]
    EndBeforeRecorded,
}

impl CommandError {
    fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }
}

/// Parse one REPL input line into a typed command
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let trimmed = line.trim();

    if trimmed.eq_ignore_ascii_case("EXIT") {
        return Ok(Command::Exit);
    }

    let tokens: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    if tokens.first() != Some(&"QUERY") {
        return Err(CommandError::syntax("expected QUERY or EXIT"));
    }
    if tokens.len() != 7 {
        return Err(CommandError::syntax(format!(
            "expected 6 arguments to QUERY, got {}",
            tokens.len() - 1
        )));
    }

    let ip = parse_ipv4(tokens[1])?;
    let cpu = parse_cpu_id(tokens[2])?;
    let start = parse_minute_fields(tokens[3], tokens[4])?;
    let end = parse_minute_fields(tokens[5], tokens[6])?;

    Ok(Command::Query(CpuQuery {
        key: ServerKey::new(ip, cpu),
        start,
        end,
    }))
}

/// Validate a query's time range against the recorded bounds.
///
/// Checks are applied in order: start >= end rejects, a start past the last
/// recorded minute rejects, an end before the first recorded minute rejects;
/// then an early start clamps up to the recorded start and a late end clamps
/// down to one minute past the last recorded sample. Clamping an in-bounds
/// range is a no-op.
pub fn clamp_range(query: &CpuQuery, bounds: &TimeBounds) -> Result<ClampedRange, CommandError> {
    if query.start >= query.end {
        return Err(CommandError::StartNotBeforeEnd);
    }
    if query.start > bounds.last_minute() {
        return Err(CommandError::StartBeyondRecorded);
    }
    if query.end < bounds.recorded_start {
        return Err(CommandError::EndBeforeRecorded);
    }

    Ok(ClampedRange {
        start: query.start.max(bounds.recorded_start),
        end: query.end.min(bounds.end_exclusive()),
    })
}

/// Parse a decimal field of bounded width into a bounded value
fn parse_bounded(text: &str, max_len: usize, max: u32, what: &str) -> Result<u32, CommandError> {
    if text.is_empty() || text.len() > max_len || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CommandError::syntax(format!("invalid {}: {:?}", what, text)));
    }
    let value: u32 = text
        .parse()
        .map_err(|_| CommandError::syntax(format!("invalid {}: {:?}", what, text)))?;
    if value > max {
        return Err(CommandError::syntax(format!(
            "{} out of range (max {}): {}",
            what, max, value
        )));
    }
    Ok(value)
}

fn parse_ipv4(text: &str) -> Result<Ipv4Addr, CommandError> {
    let parts: Vec<&str> = text.split('.').collect();
    if parts.len() != 4 {
        return Err(CommandError::syntax(format!("invalid IP address: {:?}", text)));
    }

    let mut octets = [0u8; 4];
    for (octet, part) in octets.iter_mut().zip(parts) {
        *octet = parse_bounded(part, 3, 255, "IP octet")? as u8;
    }
    Ok(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]))
}

fn parse_cpu_id(text: &str) -> Result<u8, CommandError> {
    match text {
        "0" => Ok(0),
        "1" => Ok(1),
        _ => Err(CommandError::syntax(format!("cpu_id must be 0 or 1, got {:?}", text))),
    }
}

/// Parse the `YYYY-MM-DD` and `HH:MM` tokens of one timestamp
fn parse_minute_fields(date: &str, time: &str) -> Result<i64, CommandError> {
    let date_parts: Vec<&str> = date.split('-').collect();
    if date.len() != 10 || date_parts.len() != 3 {
        return Err(CommandError::syntax(format!("invalid date: {:?}", date)));
    }
    let year = parse_bounded(date_parts[0], 4, 9999, "year")?;
    if date_parts[0].len() != 4 {
        return Err(CommandError::syntax(format!("invalid date: {:?}", date)));
    }
    let month = parse_bounded(date_parts[1], 2, 12, "month")?;
    let day = parse_bounded(date_parts[2], 2, 31, "day")?;
    if month == 0 || day == 0 {
        return Err(CommandError::syntax(format!("invalid date: {:?}", date)));
    }

    let time_parts: Vec<&str> = time.split(':').collect();
    if time.len() != 5 || time_parts.len() != 2 {
        return Err(CommandError::syntax(format!("invalid time: {:?}", time)));
    }
    let hour = parse_bounded(time_parts[0], 2, 23, "hour")?;
    let minute = parse_bounded(time_parts[1], 2, 59, "minute")?;

    let timestamp = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| {
            CommandError::syntax(format!("not a real calendar date: {:?} {:?}", date, time))
        })?;

    Ok(timestamp.and_utc().timestamp())
}
