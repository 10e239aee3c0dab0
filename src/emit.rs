#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! The three-line result record read by the caller.
//!
//! ```text
//! 0.123456789      elapsed wall time, seconds
//! 2105344          peak RSS delta in bytes, or -1 when unmeasurable
//! {"hooks":"..."}  metadata, one line of JSON
//! ```
//!
//! Line count and order are fixed regardless of content.

use std::io::Write;

use proctime_core::{Error, Result};

use crate::bench::BenchResult;

/// Printed in place of the memory delta when it could not be measured.
pub const MEMORY_UNAVAILABLE: i64 = -1;

/// Write `result` to `sink` as exactly three lines.
///
/// # Errors
///
/// Returns error if the metadata cannot be serialized or the sink rejects the
/// write.
pub fn emit<W: Write>(result: &BenchResult, sink: &mut W) -> Result<()> {
    // Serialize first so a failure cannot leave a truncated record behind
    let metadata = serde_json::to_string(result.metadata())?;
    let memory = result
        .peak_memory()
        .map_or_else(|| MEMORY_UNAVAILABLE.to_string(), |bytes| bytes.to_string());

    let record = format!(
        "{}\n{memory}\n{metadata}\n",
        result.elapsed().as_secs_f64()
    );
    sink.write_all(record.as_bytes())?;
    sink.flush().map_err(Error::Io)
}
