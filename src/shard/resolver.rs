//! Deterministic shard resolution
//!
//! Maps a composite key and a minute offset to the shard that must contain
//! the sample, without touching any file. The arithmetic reproduces the
//! exact interleave order the splitter wrote: every minute contributes one
//! fixed-order block of `servers x cpus_per_server` records, with servers in
//! increasing IP order (octet 4 cycling 1..=255 before octet 3 increments)
//! and CPU 0 before CPU 1 within a server. It is valid only under that
//! fixed-cardinality layout; a deviation in the generator's interleave
//! requires re-deriving the formula, not patching around it.

use crate::config::EngineConfig;
use crate::model::ServerKey;

/// Pure shard-index arithmetic over the fixed record interleave
#[derive(Debug, Clone, Copy)]
pub struct ShardResolver {
    cpus_per_server: i64,
    records_per_minute: i64,
    lines_per_shard: i64,
}

impl ShardResolver {
    /// Create a resolver for the given layout
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            cpus_per_server: config.cpus_per_server as i64,
            records_per_minute: config.records_per_minute() as i64,
            lines_per_shard: config.lines_per_shard as i64,
        }
    }

    /// Dense ordinal of a key within one minute block of the raw log.
    ///
    /// Keys of IPs outside the generated grid (octet 0, or beyond the fleet
    /// size) produce out-of-range ordinals; the caller is responsible for
    /// bounds-checking the resolved shard index.
    pub fn key_ordinal(&self, key: &ServerKey) -> i64 {
        let octets = key.ip.octets();
        let server_index = (octets[2] as i64 - 1) * 255 + (octets[3] as i64 - 1);
        server_index * self.cpus_per_server + key.cpu as i64
    }

    /// Resolve the shard holding the key's sample at the given minute offset
    /// from the start of shard 0.
    ///
    /// Always returns an index; the caller bounds-checks it against
    /// `[0, shard_count)`. An out-of-range result means the key was never
    /// generated.
    pub fn resolve(&self, key: &ServerKey, minute_offset: u32) -> i64 {
        let line_number = self.key_ordinal(key) + self.records_per_minute * minute_offset as i64;
        line_number.div_euclid(self.lines_per_shard)
    }
}
