use crate::error::RecordError;
use crate::normalizer::parse_record;
use crate::output::Writer;
use anyhow::{Context, Result};
use memchr::memchr_iter;
use std::fmt;
use std::io::Write;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub lines: usize,
    pub records: usize,
    pub skipped: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} records, {} skipped",
            self.lines, self.records, self.skipped
        )
    }
}

/// Feed every newline-terminated line of `bytes` through [`parse_record`] and
/// hand the records to `writer`, in order.
///
/// Stops at the first line that fails; nothing after it is read.
pub fn process<W: Write>(bytes: &[u8], writer: &mut Writer<W>) -> Result<Stats> {
    let mut stats = Stats::default();
    let mut start = 0;
    for nl in memchr_iter(b'\n', bytes) {
        process_line(&bytes[start..nl], writer, &mut stats)?;
        start = nl + 1;
    }
    if start < bytes.len() {
        process_line(&bytes[start..], writer, &mut stats)?;
    }
    Ok(stats)
}

fn process_line<W: Write>(line: &[u8], writer: &mut Writer<W>, stats: &mut Stats) -> Result<()> {
    stats.lines += 1;
    let line_no = stats.lines;

    let text = std::str::from_utf8(line)
        .map_err(RecordError::from)
        .with_context(|| format!("line {}", line_no))?;

    match parse_record(text).with_context(|| format!("line {}", line_no))? {
        Some(record) => {
            writer.write_record(&record)?;
            stats.records += 1;
        }
        None => {
            tracing::debug!(line = line_no, "skipping empty record");
            stats.skipped += 1;
        }
    }
    Ok(())
}
