//! Serial record stream.
//!
//! The host logger waits for [`READY`] and then parses one CSV line per poll cycle:
//! `hot0,cold0,hot1,cold1,...` in sensor order, two decimals, `nan,nan` for a sensor that failed
//! in that cycle.

use core::fmt::{self, Write};

use crate::poll::Cycle;

/// Sent once before the first record.
pub const READY: &str = "READY\r\n";

pub const LINE_CAPACITY: usize = 192;

pub type Line = heapless::String<LINE_CAPACITY>;

/// Format one poll cycle as a CSV record, line terminator included.
pub fn csv_line<M, T>(cycle: &Cycle<M, T>) -> Result<Line, fmt::Error> {
    let mut line = Line::new();
    for (i, result) in cycle.results.iter().enumerate() {
        if i > 0 {
            line.write_char(',')?;
        }
        match result {
            Ok(reading) => write!(
                line,
                "{:.2},{:.2}",
                reading.temperature, reading.cold_junction
            )?,
            Err(_) => line.write_str("nan,nan")?,
        }
    }
    line.write_str("\r\n")?;
    Ok(line)
}
