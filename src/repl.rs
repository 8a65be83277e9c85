//! Interactive query loop
//!
//! Drives the query engine from a line-oriented input stream. The loop is
//! the sole source of queries and processes them strictly in arrival order,
//! each to completion. Recoverable errors (malformed commands, rejected
//! time ranges) are reported and abort only the current iteration; fatal
//! errors propagate to the caller and end the process.

use std::io::{BufRead, Write};

use crate::command::{clamp_range, parse_command, Command, CommandError, COMMAND_FORMAT};
use crate::display::render_report;
use crate::error::Result;
use crate::query::QueryEngine;

/// Prompt printed before every command
const PROMPT: &str = "Enter a query:";

/// Run the REPL until `EXIT` or end of input.
///
/// Generic over its streams so tests can drive it with in-memory buffers.
pub fn run<R: BufRead, W: Write>(
    engine: &mut QueryEngine,
    input: R,
    output: &mut W,
) -> Result<()> {
    let mut lines = input.lines();

    loop {
        writeln!(output, "{}", PROMPT)?;

        let line = match lines.next() {
            Some(line) => line?,
            // End of input terminates the loop as cleanly as EXIT
            None => return Ok(()),
        };

        let query = match parse_command(&line) {
            Ok(Command::Exit) => return Ok(()),
            Ok(Command::Query(query)) => query,
            Err(error) => {
                reject(output, &error)?;
                continue;
            }
        };

        let range = match clamp_range(&query, &engine.bounds()) {
            Ok(range) => range,
            Err(error) => {
                reject(output, &error)?;
                continue;
            }
        };

        let usages = engine.execute(&query.key, &range)?;
        let report = render_report(&query.key, query.start, range.start, &usages)?;
        writeln!(output, "{}", report)?;
    }
}

/// Report a recoverable command error and re-prompt
fn reject<W: Write>(output: &mut W, error: &CommandError) -> Result<()> {
    writeln!(output, "{}", error)?;
    writeln!(output, "{}", COMMAND_FORMAT)?;
    Ok(())
}
