//! ffmpeg `-progress` side channel
//!
//! ffmpeg appends blocks of `key=value` lines to the report file while it
//! runs. Only the tail is read on each poll, and only complete lines count.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::ReelResult;

const OUT_TIME_KEY: &str = "out_time_ms=";

/// Private temporary file an ffmpeg process writes its progress into.
///
/// The file is removed when the report is dropped.
#[derive(Debug)]
pub struct ProgressReport {
    file: NamedTempFile,
    tail_bytes: u64,
}

impl ProgressReport {
    /// Create an empty report that reads at most `tail_bytes` per poll
    pub fn new(tail_bytes: u64) -> ReelResult<Self> {
        let file = tempfile::Builder::new()
            .prefix("reelcast-progress-")
            .suffix(".txt")
            .tempfile()?;
        Ok(Self { file, tail_bytes })
    }

    /// Location handed to ffmpeg's `-progress` option
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Latest `out_time_ms` value in the trailing window, in microseconds
    pub fn latest_out_time(&self) -> ReelResult<Option<u64>> {
        let mut file = self.file.reopen()?;
        let len = file.metadata()?.len();
        let start = len.saturating_sub(self.tail_bytes);
        // One byte before the window tells whether its first line is whole
        let read_from = start.saturating_sub(1);
        file.seek(SeekFrom::Start(read_from))?;

        let available = len - read_from;
        let mut buffer = Vec::with_capacity(available as usize);
        file.take(available).read_to_end(&mut buffer)?;

        let (window, starts_mid_line) = match (start > 0, buffer.split_first()) {
            (true, Some((before, rest))) => (rest, *before != b'\n'),
            _ => (buffer.as_slice(), false),
        };
        Ok(parse_latest_out_time(window, starts_mid_line))
    }
}

/// Scan a report window backward for the last complete `out_time_ms` line.
///
/// When the window starts in the middle of a line that partial first line
/// is dropped. A last line without a newline may
/// still be in the middle of being written and is dropped too. `N/A` and
/// other non-numeric values are skipped.
pub fn parse_latest_out_time(window: &[u8], starts_mid_line: bool) -> Option<u64> {
    let mut complete = window;
    if starts_mid_line {
        let first_newline = complete.iter().position(|b| *b == b'\n')?;
        complete = &complete[first_newline + 1..];
    }
    let last_newline = complete.iter().rposition(|b| *b == b'\n')?;
    let complete = &complete[..last_newline];

    String::from_utf8_lossy(complete)
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(OUT_TIME_KEY)?.trim().parse::<u64>().ok())
}
