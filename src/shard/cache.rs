//! Single-shard in-memory cache
//!
//! Holds exactly one shard's records as a map from composite key to the
//! ordered sequence of usage values for that shard's minutes. The cache is
//! replaced wholesale whenever the query engine crosses a shard boundary;
//! it never holds more than one shard (bounded memory).

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::model::{Record, ServerKey, MINUTE_SECS};
use crate::shard::{shard_path, ShardError, ShardResult};

/// Outcome of a single-minute cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The usage value recorded for the requested minute
    Usage(u8),
    /// The requested minute falls past this shard's data; the caller must
    /// advance to the next shard and retry the same minute
    ShardExhausted,
    /// The key has no series in this shard at all
    KeyNotFound,
}

/// In-memory mapping of one shard's usage series
#[derive(Debug, Default)]
pub struct ShardCache {
    entries: HashMap<ServerKey, Vec<u8>>,
    start_time: i64,
}

impl ShardCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a shard into the cache, discarding any previous contents.
    ///
    /// Streams the shard file once and appends each record's usage value to
    /// its key's sequence in file order, which is time order. Index 0 of
    /// every sequence corresponds to the shard's first minute.
    pub fn load(&mut self, shard_dir: &Path, shard_index: usize) -> ShardResult<()> {
        let path = shard_path(shard_dir, shard_index);
        let file = File::open(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ShardError::missing(&path)
            } else {
                ShardError::from(e)
            }
        })?;

        self.entries.clear();
        let mut first_timestamp = None;

        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let record = Record::parse(&line).map_err(|e| ShardError::parse(e.to_string()))?;
            if first_timestamp.is_none() {
                first_timestamp = Some(record.timestamp);
            }
            self.entries.entry(record.key).or_default().push(record.usage);
        }

        match first_timestamp {
            Some(start) => {
                self.start_time = start;
                tracing::debug!(
                    shard = shard_index,
                    keys = self.entries.len(),
                    start,
                    "loaded shard into cache"
                );
                Ok(())
            }
            None => Err(ShardError::file_error(&path, "empty shard file")),
        }
    }

    /// Look up the usage value for a key at a target minute.
    ///
    /// The sample's position is the whole-minute offset of `target_time`
    /// from the loaded shard's first timestamp.
    pub fn lookup(&self, key: &ServerKey, target_time: i64) -> LookupOutcome {
        let series = match self.entries.get(key) {
            Some(series) => series,
            None => return LookupOutcome::KeyNotFound,
        };

        let offset = (target_time - self.start_time).div_euclid(MINUTE_SECS);
        match usize::try_from(offset) {
            Ok(index) if index < series.len() => LookupOutcome::Usage(series[index]),
            Ok(_) => LookupOutcome::ShardExhausted,
            // A minute before this shard's start is unreachable while the
            // resolver contract holds; report it as absent rather than
            // walking backwards.
            Err(_) => LookupOutcome::KeyNotFound,
        }
    }

    /// First timestamp of the loaded shard
    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Number of distinct keys in the loaded shard
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }
}
