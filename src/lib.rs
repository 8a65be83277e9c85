//! # cpulog_rs
//!
//! A sharded query engine for minute-resolution per-server CPU usage logs.
//!
//! The engine ingests a flat time-series log of CPU usage samples and
//! answers bounded range queries of the form "usage for server X, CPU Y,
//! between time A and time B". At startup the raw log is partitioned into
//! fixed-size shard files; thereafter queries resolve their starting shard
//! arithmetically, load exactly one shard into memory, and walk the
//! requested range minute by minute, crossing shard boundaries as needed.
//!
//! ```no_run
//! use cpulog_rs::{clamp_range, parse_command, Command, EngineConfig, QueryEngine};
//!
//! # fn main() -> cpulog_rs::Result<()> {
//! let mut engine = QueryEngine::new(EngineConfig::default())?;
//!
//! let line = "QUERY 192.168.1.10 1 2014-10-31 00:00 2014-10-31 00:05";
//! if let Ok(Command::Query(query)) = parse_command(line) {
//!     let range = clamp_range(&query, &engine.bounds()).expect("in range");
//!     let usages = engine.execute(&query.key, &range)?;
//!     println!("{} samples", usages.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod display;
pub mod error;
pub mod generator;
pub mod model;
pub mod query;
pub mod repl;
pub mod shard;

// Re-export main types for convenience
pub use command::{clamp_range, parse_command, ClampedRange, Command, CommandError, CpuQuery};
pub use config::EngineConfig;
pub use display::render_report;
pub use error::{Error, Result};
pub use model::{Record, ServerKey, TimeBounds};
pub use query::QueryEngine;
pub use shard::{LookupOutcome, ShardCache, ShardLayout, ShardResolver, ShardSplitter};
