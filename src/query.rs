use std::time::Instant;

use crate::command::ClampedRange;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::model::{ServerKey, TimeBounds, MINUTE_SECS};
use crate::shard::{LookupOutcome, ShardCache, ShardLayout, ShardResolver, ShardSplitter};

/// Shard-loading state of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    /// No shard has been cached yet
    NoShardLoaded,
    /// The cache holds the given shard
    ShardLoaded(usize),
}

/// The query engine
///
/// Owns the shard layout, the resolver, the single-shard cache, and the
/// currently-loaded-shard state; all mutation happens through it. Built
/// once at startup, which runs the splitter synchronously before any query
/// is accepted.
#[derive(Debug)]
pub struct QueryEngine {
    config: EngineConfig,
    layout: ShardLayout,
    bounds: TimeBounds,
    resolver: ShardResolver,
    cache: ShardCache,
    state: EngineState,
}

impl QueryEngine {
    /// Create an engine: validate the configuration, split the raw log into
    /// shards, and derive the recorded time bounds from the split.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let layout = ShardSplitter::new(&config).split()?;
        let recorded_start = layout
            .recorded_start()
            .ok_or_else(|| Error::parse("raw log contains no records"))?;

        // The resolver arithmetic is only valid when every minute contributes
        // a full fixed-size block of records; a ragged record count means the
        // raw log does not match the configured fleet.
        let records_per_minute = config.records_per_minute();
        if layout.total_records % records_per_minute != 0 {
            return Err(Error::parse(format!(
                "raw log holds {} records, not a whole number of {}-record minute blocks",
                layout.total_records, records_per_minute
            )));
        }
        let recorded_minutes = (layout.total_records / records_per_minute) as u32;

        let bounds = TimeBounds::new(recorded_start, recorded_minutes);
        let resolver = ShardResolver::new(&config);

        Ok(Self {
            config,
            layout,
            bounds,
            resolver,
            cache: ShardCache::new(),
            state: EngineState::NoShardLoaded,
        })
    }

    /// Recorded time bounds of the data set
    pub fn bounds(&self) -> TimeBounds {
        self.bounds
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute a clamped query, returning one usage value per minute of the
    /// range in time order.
    ///
    /// Walks the range minute by minute against the cached shard. A
    /// `ShardExhausted` lookup advances to the next shard (monotonically)
    /// and retries the same minute; a `KeyNotFound` lookup means the key has
    /// no data anywhere in the range and terminates with an empty result.
    pub fn execute(&mut self, key: &ServerKey, range: &ClampedRange) -> Result<Vec<u8>> {
        let started = Instant::now();

        let minute_offset = (range.start - self.bounds.recorded_start).div_euclid(MINUTE_SECS);
        let minute_offset = u32::try_from(minute_offset)
            .map_err(|_| Error::internal("query start precedes the recorded start"))?;

        let shard_count = self.layout.shard_count();
        let mut shard = match usize::try_from(self.resolver.resolve(key, minute_offset)) {
            // A key that resolves outside [0, S-1] was never generated
            Ok(index) if index < shard_count => index,
            _ => return Ok(Vec::new()),
        };

        self.ensure_loaded(shard)?;

        let mut results = Vec::new();
        let mut current = range.start;
        while current < range.end {
            match self.cache.lookup(key, current) {
                LookupOutcome::Usage(usage) => {
                    results.push(usage);
                    current += MINUTE_SECS;
                }
                LookupOutcome::ShardExhausted => {
                    shard += 1;
                    if shard >= shard_count {
                        // Clamping guarantees the range ends inside the last
                        // shard, so running off the end is a bug
                        return Err(Error::internal(format!(
                            "shard advance past last shard while {} minutes remain",
                            (range.end - current) / MINUTE_SECS
                        )));
                    }
                    self.ensure_loaded(shard)?;
                    // retry the same minute against the new shard
                }
                LookupOutcome::KeyNotFound => return Ok(Vec::new()),
            }
        }

        tracing::debug!(
            key = %key,
            results = results.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "query executed"
        );
        Ok(results)
    }

    /// Load the given shard unless it is already cached
    fn ensure_loaded(&mut self, shard: usize) -> Result<()> {
        if self.state == EngineState::ShardLoaded(shard) {
            return Ok(());
        }

        self.cache.load(&self.config.shard_dir, shard)?;
        self.state = EngineState::ShardLoaded(shard);
        tracing::debug!(shard, "switched cached shard");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{clamp_range, CpuQuery};
    use crate::generator::{generate_log, DEFAULT_LOG_START};
    use crate::model::Record;
    use crate::shard::shard_path;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use std::path::Path;

    fn build_engine(dir: &Path, minutes: u32, lines_per_shard: u64) -> Result<QueryEngine> {
        let config = EngineConfig::new()
            .with_raw_log(dir.join("raw.txt"))
            .with_shard_dir(dir)
            .with_servers(2)
            .with_cpus_per_server(2)
            .with_recorded_minutes(minutes)
            .with_lines_per_shard(lines_per_shard);

        let mut rng = StdRng::seed_from_u64(11);
        generate_log(&config, DEFAULT_LOG_START, &mut rng)?;
        QueryEngine::new(config)
    }

    /// Reference implementation: linear scan of the raw log
    fn brute_force(raw_log: &Path, key: &ServerKey, start: i64, end: i64) -> Vec<u8> {
        let content = fs::read_to_string(raw_log).unwrap();
        content
            .lines()
            .skip(1)
            .map(|line| Record::parse(line).unwrap())
            .filter(|r| r.key == *key && r.timestamp >= start && r.timestamp < end)
            .map(|r| r.usage)
            .collect()
    }

    fn clamped(engine: &QueryEngine, start: i64, end: i64) -> ClampedRange {
        let key = ServerKey::from_octets([192, 168, 1, 1], 0);
        clamp_range(&CpuQuery { key, start, end }, &engine.bounds()).unwrap()
    }

    #[test]
    fn test_two_minute_query() -> Result<()> {
        let dir = tempfile::tempdir()?;
        // One shard per minute
        let mut engine = build_engine(dir.path(), 3, 4)?;

        let key = ServerKey::from_octets([192, 168, 1, 1], 0);
        let range = clamped(&engine, DEFAULT_LOG_START, DEFAULT_LOG_START + 2 * MINUTE_SECS);
        let results = engine.execute(&key, &range)?;

        assert_eq!(results.len(), 2);
        assert_eq!(
            results,
            brute_force(&engine.config().raw_log, &key, range.start, range.end)
        );
        Ok(())
    }

    #[test]
    fn test_query_spanning_shard_boundaries() -> Result<()> {
        let dir = tempfile::tempdir()?;
        // 6 minutes in 2-minute shards; the query crosses two boundaries
        let mut engine = build_engine(dir.path(), 6, 8)?;

        for cpu in 0..2 {
            for octet4 in 1..=2 {
                let key = ServerKey::from_octets([192, 168, 1, octet4], cpu);
                let range = clamped(
                    &engine,
                    DEFAULT_LOG_START + MINUTE_SECS,
                    DEFAULT_LOG_START + 5 * MINUTE_SECS,
                );
                let results = engine.execute(&key, &range)?;

                assert_eq!(results.len(), 4, "key {}", key);
                assert_eq!(
                    results,
                    brute_force(&engine.config().raw_log, &key, range.start, range.end),
                    "key {}",
                    key
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_full_range_query_matches_linear_scan() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut engine = build_engine(dir.path(), 6, 8)?;

        let key = ServerKey::from_octets([192, 168, 1, 2], 1);
        let range = clamped(&engine, DEFAULT_LOG_START, DEFAULT_LOG_START + 6 * MINUTE_SECS);
        let results = engine.execute(&key, &range)?;

        assert_eq!(results.len(), 6);
        assert_eq!(
            results,
            brute_force(&engine.config().raw_log, &key, range.start, range.end)
        );
        Ok(())
    }

    #[test]
    fn test_unknown_key_returns_empty_result() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut engine = build_engine(dir.path(), 3, 4)?;

        // Within the shard grid but never generated (only 2 servers exist)
        let range = clamped(&engine, DEFAULT_LOG_START, DEFAULT_LOG_START + 2 * MINUTE_SECS);
        let absent = ServerKey::from_octets([192, 168, 1, 3], 0);
        assert!(engine.execute(&absent, &range)?.is_empty());

        // Far outside the shard grid entirely
        let far = ServerKey::from_octets([250, 250, 250, 250], 1);
        assert!(engine.execute(&far, &range)?.is_empty());

        // Below the grid (octet 0 produces a negative ordinal)
        let below = ServerKey::from_octets([192, 168, 0, 1], 0);
        assert!(engine.execute(&below, &range)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_bounds_derived_from_split() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let engine = build_engine(dir.path(), 6, 8)?;

        let bounds = engine.bounds();
        assert_eq!(bounds.recorded_start, DEFAULT_LOG_START);
        assert_eq!(bounds.recorded_minutes, 6);
        Ok(())
    }

    #[test]
    fn test_missing_shard_file_is_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut engine = build_engine(dir.path(), 6, 8)?;

        fs::remove_file(shard_path(dir.path(), 1))?;

        let key = ServerKey::from_octets([192, 168, 1, 1], 0);
        let range = clamped(&engine, DEFAULT_LOG_START, DEFAULT_LOG_START + 6 * MINUTE_SECS);
        let err = engine.execute(&key, &range).unwrap_err();
        assert!(err.is_fatal());
        Ok(())
    }

    #[test]
    fn test_ragged_raw_log_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = EngineConfig::new()
            .with_raw_log(dir.path().join("raw.txt"))
            .with_shard_dir(dir.path())
            .with_servers(2)
            .with_cpus_per_server(2)
            .with_recorded_minutes(3)
            .with_lines_per_shard(4);

        // 5 records is not a whole number of 4-record minute blocks
        let mut content = String::from("timestamp IP cpu_id usage\n");
        for line in [
            "1414713600 192.168.1.1 0 1",
            "1414713600 192.168.1.1 1 2",
            "1414713600 192.168.1.2 0 3",
            "1414713600 192.168.1.2 1 4",
            "1414713660 192.168.1.1 0 5",
        ] {
            content.push_str(line);
            content.push('\n');
        }
        fs::write(&config.raw_log, content)?;

        let err = QueryEngine::new(config).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        Ok(())
    }
}
