//! Compaction Module
//!
//! Reclaims the space held by tombstoned slots.
//!
//! ## Protocol
//! 1. Empty log: nothing to do, no temp file is created
//! 2. Stream every live slot into `{path}{temp_suffix}`
//! 3. Any failure: delete the temp file, leave the log untouched
//! 4. Rename the temp file over the log (atomic replace)
//! 5. The live count becomes the number of slots copied
//!
//! Slots are located with a header-only walk and copied through a second
//! read handle in bounded chunks, so peak memory does not depend on record
//! length. An unterminated last slot gets its terminator in the copy.

use std::io::{self, Read, Seek, SeekFrom, Write};

use tracing::{debug, info, warn};

use crate::codec::RecordCodec;
use crate::config::SyncStrategy;
use crate::error::{FifoLogError, Result};
use crate::scan::SlotHeaders;
use crate::slot::TERMINATOR;
use crate::storage::{OpenMode, Storage, StorageHandle};
use crate::store::LogStore;

/// Result of a successful defragmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefragOutcome {
    /// Live records in the compacted log
    pub live_records: usize,

    /// Log size before compaction (bytes)
    pub bytes_before: u64,

    /// Log size after compaction (bytes)
    pub bytes_after: u64,
}

impl DefragOutcome {
    /// Bytes given back to the medium
    ///
    /// Zero when the copy grew, which happens when a terminator was added
    /// to an unterminated last slot.
    pub fn reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

impl<C: RecordCodec, S: Storage> LogStore<C, S> {
    /// Rewrite the log keeping only live slots, in their original order
    ///
    /// On failure the original file is left exactly as it was and any
    /// partial temp file is deleted.
    pub fn defragment(&mut self) -> Result<DefragOutcome> {
        let temp_path = self.temp_path();

        let mut source = self.open_file(OpenMode::Read)?;
        let bytes_before = source.size().map_err(|e| {
            warn!(error = %e, "failed to read log size");
            FifoLogError::Io(e)
        })?;
        if bytes_before == 0 {
            debug!("log is empty, nothing to defragment");
            return Ok(DefragOutcome {
                live_records: self.current_size,
                bytes_before: 0,
                bytes_after: 0,
            });
        }

        let headers = self.open_file(OpenMode::Read)?;

        debug!(path = %temp_path.display(), bytes_before, "starting defragmentation");

        let copied = self
            .storage
            .open(&temp_path, OpenMode::WriteTruncate)
            .and_then(|mut temp| {
                let copied = copy_live_slots(
                    headers,
                    &mut source,
                    &mut temp,
                    self.config.scan_buffer_size,
                )?;
                temp.flush()?;
                if self.config.sync_strategy == SyncStrategy::EveryWrite {
                    temp.sync()?;
                }
                Ok(copied)
            });
        drop(source);

        let (live_records, bytes_after) = match copied {
            Ok(copied) => copied,
            Err(e) => {
                warn!(error = %e, "defragmentation aborted while copying");
                self.discard_temp();
                return Err(FifoLogError::Io(e));
            }
        };

        if let Err(e) = self.storage.rename(&temp_path, &self.config.path) {
            warn!(error = %e, "defragmentation aborted while replacing log");
            self.discard_temp();
            return Err(FifoLogError::Io(e));
        }

        self.current_size = live_records;
        let outcome = DefragOutcome {
            live_records,
            bytes_before,
            bytes_after,
        };
        info!(
            live_records,
            reclaimed = outcome.reclaimed(),
            "defragmentation complete"
        );
        Ok(outcome)
    }

    fn discard_temp(&self) {
        let temp_path = self.temp_path();
        if self.storage.exists(&temp_path) {
            if let Err(e) = self.storage.remove(&temp_path) {
                warn!(path = %temp_path.display(), error = %e, "failed to remove temp file");
            }
        }
    }
}

/// Copy live slots verbatim; returns (slots copied, bytes written)
///
/// `headers` drives the walk, `source` is a second handle on the same file
/// that the slot bytes are copied from.
fn copy_live_slots<H: Read, R: Read + Seek, W: Write>(
    headers: H,
    source: &mut R,
    target: &mut W,
    buffer_size: usize,
) -> io::Result<(usize, u64)> {
    let mut copied = 0;
    let mut written = 0;

    for header in SlotHeaders::new(headers, buffer_size) {
        let header = header.map_err(|e| match e {
            FifoLogError::Io(e) => e,
            other => io::Error::other(other.to_string()),
        })?;
        if !header.is_live() {
            continue;
        }

        source.seek(SeekFrom::Start(header.offset))?;
        let mut slot = (&mut *source).take(header.len);
        let moved = io::copy(&mut slot, target)?;
        if moved != header.len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "log shrank during defragmentation",
            ));
        }
        written += moved;
        if !header.terminated {
            target.write_all(&[TERMINATOR])?;
            written += 1;
        }
        copied += 1;
    }

    Ok((copied, written))
}
