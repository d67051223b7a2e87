// Line-aligned splitting of the corpus body.
// Every cut lands right after a '\n' so no record straddles two workers.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A contiguous slice of the shared corpus buffer, in absolute offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub offset: usize,
    pub length: usize,
}

impl ByteRange {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn as_range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// Split `buffer[data_start..]` into `nranges` line-aligned ranges.
///
/// Range `i` starts where range `i - 1` ends. A tentative cut at
/// `i * (data_size / nranges)` moves forward to the start of the next line
/// and never backward; the last range takes whatever remains. Ranges may be
/// empty when the body has fewer lines than workers.
///
/// Scanning more than `max_record_bytes` without meeting a line terminator
/// is reported as [`Error::RecordTooLong`].
pub fn partition(
    buffer: &[u8],
    data_start: usize,
    nranges: usize,
    max_record_bytes: usize,
) -> Result<Vec<ByteRange>> {
    if nranges == 0 {
        return Err(Error::InvalidWorkerCount);
    }
    let data_start = data_start.min(buffer.len());
    let data = &buffer[data_start..];
    let data_size = data.len();
    let ideal = data_size / nranges;

    let mut ranges = Vec::with_capacity(nranges);
    let mut start = 0;
    for i in 1..nranges {
        let tentative = (i * ideal).max(start);
        let cut = align_to_line_start(data, tentative, max_record_bytes)
            .map_err(|offset| Error::RecordTooLong {
                offset: data_start + offset,
                limit: max_record_bytes,
            })?;
        ranges.push(ByteRange {
            offset: data_start + start,
            length: cut - start,
        });
        start = cut;
    }
    ranges.push(ByteRange {
        offset: data_start + start,
        length: data_size - start,
    });

    Ok(ranges)
}

/// First line start at or after `pos`. `Err` carries the offset where the
/// scan began when no terminator shows up within `max_record_bytes`.
fn align_to_line_start(
    data: &[u8],
    pos: usize,
    max_record_bytes: usize,
) -> core::result::Result<usize, usize> {
    if pos >= data.len() {
        return Ok(data.len());
    }
    if pos == 0 || data[pos - 1] == b'\n' {
        return Ok(pos);
    }
    let window_end = data.len().min(pos.saturating_add(max_record_bytes));
    match data[pos..window_end].iter().position(|&b| b == b'\n') {
        Some(newline) => Ok(pos + newline + 1),
        None if window_end == data.len() => Ok(data.len()),
        None => Err(pos),
    }
}
