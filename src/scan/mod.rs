//! Scan Module
//!
//! Two ways through the log file, both with fixed-size buffers.
//!
//! ## Forward
//! Streams slots from offset 0 through a small read-ahead buffer, tracking
//! each slot's cursor. Backs indexed reads, batch deletion, counting,
//! compaction and metrics.
//!
//! ## Reverse
//! Reads fixed-size blocks from the end of the file backwards to find the
//! last live record without walking the whole log.

mod forward;
mod reverse;

use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use tracing::warn;

use crate::error::{FifoLogError, Result};
use crate::slot::{payload_of, TERMINATOR};

pub use forward::{LiveRecords, SlotHeaders, SlotScanner};

/// Read the line starting at `offset`, trimmed; empty at end of file
pub(crate) fn read_payload_at<H: Read + Seek>(
    file: &mut H,
    offset: u64,
    read_ahead: usize,
) -> Result<String> {
    let mut line = Vec::new();
    file.seek(SeekFrom::Start(offset))
        .and_then(|_| BufReader::with_capacity(read_ahead, file).read_until(TERMINATOR, &mut line))
        .map_err(|e| {
            warn!(offset, error = %e, "failed to read record");
            FifoLogError::Io(e)
        })?;
    Ok(payload_of(&line))
}
