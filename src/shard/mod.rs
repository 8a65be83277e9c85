//! Shard subsystem for the raw CPU usage log
//!
//! The raw log is partitioned once at startup into fixed-size shard files.
//! This module holds the splitter that performs the partition, the pure
//! resolver that maps a key and minute to its shard, and the single-shard
//! in-memory cache the query engine reads from.

mod cache;
mod error;
mod resolver;
mod splitter;

pub use cache::{LookupOutcome, ShardCache};
pub use error::{ShardError, ShardResult};
pub use resolver::ShardResolver;
pub use splitter::{ShardLayout, ShardSplitter};

use std::path::{Path, PathBuf};

/// File-name prefix of every shard file
pub(crate) const SHARD_FILE_PREFIX: &str = "Log";

/// File-name extension of every shard file
pub(crate) const SHARD_FILE_EXT: &str = "txt";

/// Get the path for a shard file
pub fn shard_path(shard_dir: &Path, shard_index: usize) -> PathBuf {
    shard_dir.join(format!("{}{}.{}", SHARD_FILE_PREFIX, shard_index, SHARD_FILE_EXT))
}
