//! Configuration for the query engine
//!
//! This module provides configuration options for the raw log layout and the
//! shard-splitting scheme. The defaults reproduce the original data set:
//! 1000 servers with 2 CPUs each, sampled every minute for one day, split
//! into shards of 960,000 records.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default raw log file name
pub const DEFAULT_LOG_FILE: &str = "cpuLogs.txt";

/// Configuration options for the query engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // Data layout
    /// Path to the raw log file
    pub raw_log: PathBuf,
    /// Directory that receives the shard files
    pub shard_dir: PathBuf,

    // Fleet dimensions
    /// Number of servers emitting samples
    pub servers: u32,
    /// Number of CPUs per server
    pub cpus_per_server: u32,
    /// Number of recorded minutes in the raw log
    pub recorded_minutes: u32,
    /// Fixed first two octets of every server IP
    pub ip_prefix: [u8; 2],

    // Shard scheme
    /// Number of records per shard file
    pub lines_per_shard: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            raw_log: PathBuf::from(DEFAULT_LOG_FILE),
            shard_dir: PathBuf::from("."),
            servers: 1000,
            cpus_per_server: 2,
            recorded_minutes: 1440,
            ip_prefix: [192, 168],
            // 480 minutes (8 hours) of data per shard
            lines_per_shard: 480 * 2000,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw log path
    pub fn with_raw_log<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.raw_log = path.as_ref().to_path_buf();
        self
    }

    /// Set the shard directory
    pub fn with_shard_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.shard_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the number of servers
    pub fn with_servers(mut self, servers: u32) -> Self {
        self.servers = servers;
        self
    }

    /// Set the number of CPUs per server
    pub fn with_cpus_per_server(mut self, cpus: u32) -> Self {
        self.cpus_per_server = cpus;
        self
    }

    /// Set the number of recorded minutes
    pub fn with_recorded_minutes(mut self, minutes: u32) -> Self {
        self.recorded_minutes = minutes;
        self
    }

    /// Set the fixed first two IP octets
    pub fn with_ip_prefix(mut self, prefix: [u8; 2]) -> Self {
        self.ip_prefix = prefix;
        self
    }

    /// Set the number of records per shard file
    pub fn with_lines_per_shard(mut self, lines: u64) -> Self {
        self.lines_per_shard = lines;
        self
    }

    /// Number of records every minute contributes to the raw log
    pub fn records_per_minute(&self) -> u64 {
        self.servers as u64 * self.cpus_per_server as u64
    }

    /// Total number of records in the raw log
    pub fn total_records(&self) -> u64 {
        self.recorded_minutes as u64 * self.records_per_minute()
    }

    /// Number of shard files the splitter produces
    pub fn shard_count(&self) -> usize {
        let total = self.total_records();
        (total / self.lines_per_shard + u64::from(total % self.lines_per_shard != 0)) as usize
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.servers < 1 {
            return Err(Error::config("servers must be at least 1"));
        }

        // Deterministic IP assignment cycles octet 4 through 1..=255 before
        // incrementing octet 3, which is itself capped at 255.
        if self.servers as u64 > 255 * 255 {
            return Err(Error::config("servers must not exceed 65025 (255 x 255)"));
        }

        if self.cpus_per_server < 1 {
            return Err(Error::config("cpus_per_server must be at least 1"));
        }

        if self.recorded_minutes < 1 {
            return Err(Error::config("recorded_minutes must be at least 1"));
        }

        if self.lines_per_shard < 1 {
            return Err(Error::config("lines_per_shard must be at least 1"));
        }

        // The cache computes a sample's position from its minute offset into
        // the shard, which requires shard boundaries to fall on whole minutes.
        if self.lines_per_shard % self.records_per_minute() != 0 {
            return Err(Error::config(format!(
                "lines_per_shard ({}) must be a multiple of records per minute ({})",
                self.lines_per_shard,
                self.records_per_minute()
            )));
        }

        Ok(())
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }
}
