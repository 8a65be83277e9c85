//! Result presentation
//!
//! Formats an ordered usage sequence for display, pairing each value with a
//! timestamp reconstructed from the clamped start time at one-minute steps.

use crate::error::Result;
use crate::model::{format_minute, ServerKey, MINUTE_SECS};

/// Render a query result for display.
///
/// The report is a `CPU<id> usage on <ip>:` header followed by the
/// `(minute, usage%)` pairs on one line. An empty sequence is a normal
/// outcome and renders as a "doesn't exist" line naming the key and the
/// originally requested start time.
pub fn render_report(
    key: &ServerKey,
    requested_start: i64,
    clamped_start: i64,
    usages: &[u8],
) -> Result<String> {
    let mut report = format!("CPU{} usage on {}:\n", key.cpu, key.ip);

    if usages.is_empty() {
        report.push_str(&format!(
            "Usage for CPU{} on {} starting at {} doesn't exist",
            key.cpu,
            key.ip,
            format_minute(requested_start)?
        ));
        return Ok(report);
    }

    let pairs: Vec<String> = usages
        .iter()
        .enumerate()
        .map(|(index, usage)| {
            let minute = clamped_start + index as i64 * MINUTE_SECS;
            Ok(format!("({}, {}%)", format_minute(minute)?, usage))
        })
        .collect::<Result<_>>()?;
    report.push_str(&pairs.join(", "));

    Ok(report)
}
