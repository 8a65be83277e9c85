//! Raw log generator
//!
//! Writes the fixed-format raw log the query engine consumes: one header
//! line, then one record per server CPU per minute. Records are emitted in
//! lock-step: at every whole minute, servers appear in increasing IP order
//! and each server emits CPU 0 before CPU 1. IPs share a fixed two-octet
//! prefix, with the last octet cycling 1..=255 before the third octet
//! increments. Usage values are drawn from the caller's RNG, so tests can
//! seed it for reproducible data.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};

use rand::Rng;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::MINUTE_SECS;

/// Header line of the raw log
pub const LOG_HEADER: &str = "timestamp IP cpu_id usage";

/// Default first recorded minute: 2014-10-31 00:00 UTC
pub const DEFAULT_LOG_START: i64 = 1414713600;

/// Highest generated usage value (inclusive)
const USAGE_MAX: u8 = 99;

/// Generate a raw log at `config.raw_log`, starting at `start` (unix
/// seconds) and covering `config.recorded_minutes` minutes.
pub fn generate_log<R: Rng>(config: &EngineConfig, start: i64, rng: &mut R) -> Result<()> {
    let file: File = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&config.raw_log)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", LOG_HEADER)?;

    for minute in 0..config.recorded_minutes {
        let timestamp = start + minute as i64 * MINUTE_SECS;
        write_minute_block(&mut writer, config, timestamp, rng)?;
    }

    writer.flush()?;
    tracing::info!(
        path = %config.raw_log.display(),
        minutes = config.recorded_minutes,
        records = config.total_records(),
        "generated raw log"
    );
    Ok(())
}

/// Write one minute's records for the whole fleet
fn write_minute_block<W: Write, R: Rng>(
    writer: &mut W,
    config: &EngineConfig,
    timestamp: i64,
    rng: &mut R,
) -> io::Result<()> {
    let [prefix0, prefix1] = config.ip_prefix;
    let mut octet3: u32 = 1;
    let mut octet4: u32 = 1;

    for _ in 0..config.servers {
        for cpu in 0..config.cpus_per_server {
            let usage = rng.gen_range(0..=USAGE_MAX);
            writeln!(
                writer,
                "{} {}.{}.{}.{} {} {}",
                timestamp, prefix0, prefix1, octet3, octet4, cpu, usage
            )?;
        }

        octet4 += 1;
        if octet4 > 255 {
            octet4 = 1;
            octet3 += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;

    #[test]
    fn test_generated_log_shape() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = EngineConfig::new()
            .with_raw_log(dir.path().join("raw.txt"))
            .with_servers(3)
            .with_cpus_per_server(2)
            .with_recorded_minutes(2)
            .with_lines_per_shard(6);

        let mut rng = StdRng::seed_from_u64(7);
        generate_log(&config, DEFAULT_LOG_START, &mut rng)?;

        let content = fs::read_to_string(&config.raw_log)?;
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(LOG_HEADER));

        let records: Vec<Record> = lines.map(|l| Record::parse(l)).collect::<Result<_>>()?;
        assert_eq!(records.len(), 12);

        // Lock-step interleave: per minute, servers in IP order, cpu 0 then 1
        let first_minute: Vec<_> = records[..6]
            .iter()
            .map(|r| (r.key.ip.octets()[3], r.key.cpu))
            .collect();
        assert_eq!(first_minute, vec![(1, 0), (1, 1), (2, 0), (2, 1), (3, 0), (3, 1)]);

        // One sample per key per minute, timestamps advance by whole minutes
        assert!(records[..6].iter().all(|r| r.timestamp == DEFAULT_LOG_START));
        assert!(records[6..].iter().all(|r| r.timestamp == DEFAULT_LOG_START + MINUTE_SECS));

        assert!(records.iter().all(|r| r.usage <= USAGE_MAX));
        Ok(())
    }

    #[test]
    fn test_ip_assignment_rolls_over_octet() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = EngineConfig::new()
            .with_raw_log(dir.path().join("raw.txt"))
            .with_servers(257)
            .with_cpus_per_server(1)
            .with_recorded_minutes(1)
            .with_lines_per_shard(257);

        let mut rng = StdRng::seed_from_u64(7);
        generate_log(&config, DEFAULT_LOG_START, &mut rng)?;

        let content = fs::read_to_string(&config.raw_log)?;
        let records: Vec<Record> = content
            .lines()
            .skip(1)
            .map(|l| Record::parse(l))
            .collect::<Result<_>>()?;

        // Server 255 is x.x.1.255; servers 256 and 257 roll into x.x.2.*
        assert_eq!(records[254].key.ip.octets()[2..], [1, 255]);
        assert_eq!(records[255].key.ip.octets()[2..], [2, 1]);
        assert_eq!(records[256].key.ip.octets()[2..], [2, 2]);
        Ok(())
    }

    #[test]
    fn test_seeded_generation_is_reproducible() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = EngineConfig::new()
            .with_raw_log(dir.path().join("raw.txt"))
            .with_servers(2)
            .with_cpus_per_server(2)
            .with_recorded_minutes(2)
            .with_lines_per_shard(4);

        let mut rng = StdRng::seed_from_u64(42);
        generate_log(&config, DEFAULT_LOG_START, &mut rng)?;
        let first = fs::read_to_string(&config.raw_log)?;

        let mut rng = StdRng::seed_from_u64(42);
        generate_log(&config, DEFAULT_LOG_START, &mut rng)?;
        let second = fs::read_to_string(&config.raw_log)?;

        assert_eq!(first, second);
        Ok(())
    }
}
