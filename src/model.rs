//! Core data model for CPU usage logs
//!
//! Defines the record and composite-key types shared by the splitter, cache,
//! and query engine, plus the timestamp helpers for the `YYYY-MM-DD HH:MM`
//! wire format.

use std::fmt;
use std::net::Ipv4Addr;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{Error, Result};

/// Seconds per recorded sample interval
pub const MINUTE_SECS: i64 = 60;

/// Timestamp format used by queries and the result presenter
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Composite key identifying one usage time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerKey {
    /// Server IP address
    pub ip: Ipv4Addr,
    /// CPU id within the server (0 or 1)
    pub cpu: u8,
}

impl ServerKey {
    /// Create a new composite key
    pub fn new(ip: Ipv4Addr, cpu: u8) -> Self {
        Self { ip, cpu }
    }

    /// Create a key from four octets and a CPU id
    pub fn from_octets(octets: [u8; 4], cpu: u8) -> Self {
        Self {
            ip: Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]),
            cpu,
        }
    }
}

impl fmt::Display for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cpu{}", self.ip, self.cpu)
    }
}

/// One usage sample from the raw log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// Sample time in unix seconds
    pub timestamp: i64,
    /// Series the sample belongs to
    pub key: ServerKey,
    /// CPU usage in percent (0-99)
    pub usage: u8,
}

impl Record {
    /// Parse one record line: `<unix-seconds> <a.b.c.d> <cpu_id> <usage>`
    pub fn parse(line: &str) -> Result<Self> {
        let mut fields = line.split_ascii_whitespace();

        let timestamp = fields
            .next()
            .ok_or_else(|| Error::parse(format!("missing timestamp: {:?}", line)))?
            .parse::<i64>()
            .map_err(|_| Error::parse(format!("invalid timestamp: {:?}", line)))?;

        let ip = fields
            .next()
            .ok_or_else(|| Error::parse(format!("missing IP address: {:?}", line)))?
            .parse::<Ipv4Addr>()
            .map_err(|_| Error::parse(format!("invalid IP address: {:?}", line)))?;

        let cpu = fields
            .next()
            .ok_or_else(|| Error::parse(format!("missing cpu_id: {:?}", line)))?
            .parse::<u8>()
            .map_err(|_| Error::parse(format!("invalid cpu_id: {:?}", line)))?;

        let usage = fields
            .next()
            .ok_or_else(|| Error::parse(format!("missing usage: {:?}", line)))?
            .parse::<u8>()
            .map_err(|_| Error::parse(format!("invalid usage: {:?}", line)))?;

        if fields.next().is_some() {
            return Err(Error::parse(format!("trailing fields: {:?}", line)));
        }

        Ok(Self {
            timestamp,
            key: ServerKey::new(ip, cpu),
            usage,
        })
    }

    /// Parse only the leading timestamp field of a record line
    pub fn parse_timestamp(line: &str) -> Result<i64> {
        line.split_ascii_whitespace()
            .next()
            .ok_or_else(|| Error::parse(format!("empty record line: {:?}", line)))?
            .parse::<i64>()
            .map_err(|_| Error::parse(format!("invalid timestamp: {:?}", line)))
    }
}

/// Recorded time bounds of the data set
///
/// The recorded range covers `recorded_minutes` whole-minute samples starting
/// at `recorded_start`. Query clamping and rejection are defined against
/// these bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    /// Timestamp of the first recorded sample
    pub recorded_start: i64,
    /// Number of recorded minutes
    pub recorded_minutes: u32,
}

impl TimeBounds {
    /// Create new time bounds
    pub fn new(recorded_start: i64, recorded_minutes: u32) -> Self {
        Self {
            recorded_start,
            recorded_minutes,
        }
    }

    /// Timestamp of the last recorded sample (inclusive)
    pub fn last_minute(&self) -> i64 {
        self.recorded_start + (self.recorded_minutes as i64 - 1) * MINUTE_SECS
    }

    /// Timestamp one minute past the last recorded sample
    pub fn end_exclusive(&self) -> i64 {
        self.recorded_start + self.recorded_minutes as i64 * MINUTE_SECS
    }
}

/// Parse a `YYYY-MM-DD HH:MM` timestamp into unix seconds (UTC)
pub fn parse_minute(text: &str) -> Result<i64> {
    let naive = NaiveDateTime::parse_from_str(text, MINUTE_FORMAT)
        .map_err(|e| Error::timestamp(format!("invalid timestamp {:?}: {}", text, e)))?;
    Ok(naive.and_utc().timestamp())
}

/// Format unix seconds (UTC) as `YYYY-MM-DD HH:MM`
pub fn format_minute(timestamp: i64) -> Result<String> {
    let time: DateTime<Utc> = DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| Error::timestamp(format!("timestamp out of range: {}", timestamp)))?;
    Ok(time.format(MINUTE_FORMAT).to_string())
}
