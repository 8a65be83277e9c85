//! Shard splitter for the raw log
//!
//! Partitions the raw log into contiguous fixed-size shard files, recording
//! each shard's first timestamp on the way through. The split runs once,
//! synchronously, before any query is accepted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use crate::config::EngineConfig;
use crate::model::Record;
use crate::shard::{shard_path, ShardError, ShardResult};

/// Side table produced by the splitter
///
/// `start_times[i]` holds the timestamp of the first record written to shard
/// `i`. Shards are numbered in file order; their time ranges are contiguous
/// and non-overlapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardLayout {
    /// First timestamp of each shard, indexed by shard number
    pub start_times: Vec<i64>,
    /// Total number of records across all shards
    pub total_records: u64,
}

impl ShardLayout {
    /// Number of shards in the layout
    pub fn shard_count(&self) -> usize {
        self.start_times.len()
    }

    /// First timestamp of the given shard
    pub fn start_time(&self, shard_index: usize) -> Option<i64> {
        self.start_times.get(shard_index).copied()
    }

    /// First recorded timestamp of the whole data set
    pub fn recorded_start(&self) -> Option<i64> {
        self.start_times.first().copied()
    }
}

/// Partitions the raw log into shard files
pub struct ShardSplitter<'a> {
    config: &'a EngineConfig,
}

impl<'a> ShardSplitter<'a> {
    /// Create a new splitter for the given configuration
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Run the partition pass.
    ///
    /// Reads the header line and discards it, then streams records into
    /// `Log<i>.txt` files of `lines_per_shard` records each (the final shard
    /// may be short). Existing shard files are rewritten. Not safe to
    /// interleave with reads of the shards being written; the engine runs
    /// the split to completion before serving queries.
    pub fn split(&self) -> ShardResult<ShardLayout> {
        let file = File::open(&self.config.raw_log).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ShardError::missing(&self.config.raw_log)
            } else {
                ShardError::from(e)
            }
        })?;
        let mut reader = BufReader::new(file);

        // Header line, discarded
        let mut header = String::new();
        reader.read_line(&mut header)?;

        fs::create_dir_all(&self.config.shard_dir)?;

        let mut start_times = Vec::with_capacity(self.config.shard_count());
        let mut writer: Option<BufWriter<File>> = None;
        let mut lines_in_shard = 0u64;
        let mut total_records = 0u64;

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            if lines_in_shard == 0 {
                if let Some(mut finished) = writer.take() {
                    finished.flush()?;
                }

                let shard_index = start_times.len();
                let path = shard_path(&self.config.shard_dir, shard_index);
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&path)
                    .map_err(|e| {
                        ShardError::file_error(&path, format!("failed to create shard file: {}", e))
                    })?;
                writer = Some(BufWriter::new(file));

                let start = Record::parse_timestamp(&line)
                    .map_err(|e| ShardError::parse(e.to_string()))?;
                start_times.push(start);
                tracing::debug!(shard = shard_index, start, "opened shard file");
            }

            if let Some(current) = writer.as_mut() {
                writeln!(current, "{}", line)?;
            }

            lines_in_shard += 1;
            total_records += 1;

            if lines_in_shard == self.config.lines_per_shard {
                lines_in_shard = 0;
            }
        }

        if let Some(mut finished) = writer.take() {
            finished.flush()?;
        }

        tracing::info!(
            shards = start_times.len(),
            records = total_records,
            "split raw log into shard files"
        );

        Ok(ShardLayout {
            start_times,
            total_records,
        })
    }
}
